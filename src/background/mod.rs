//! Off-thread session assembly
//!
//! Building a session can take many seconds: each uncached tile is a network
//! round trip plus the throttle pause. [`spawn_session`] moves that work to a
//! worker thread and streams progress back over a channel so a caller can
//! keep its own loop responsive.

use crate::core::config::MapParams;
use crate::core::map::MapSession;
use crate::tiles::fetcher::TileFetcher;
use crate::traits::ProgressReporter;
use crate::{MapError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Progress of an assembly, as seen from another thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { total: u32 },
    Updated { completed: u32 },
    Stopped,
}

/// Forwards progress into a channel. Sending to a dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: Sender<ProgressEvent>,
}

impl ChannelReporter {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self { sender }
    }

    /// A reporter together with the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<ProgressEvent>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

impl ProgressReporter for ChannelReporter {
    fn start(&mut self, total: u32) {
        self.send(ProgressEvent::Started { total });
    }

    fn update(&mut self, completed: u32) {
        self.send(ProgressEvent::Updated { completed });
    }

    fn stop(&mut self) {
        self.send(ProgressEvent::Stopped);
    }
}

/// A session being built on a worker thread.
#[derive(Debug)]
pub struct AssemblyHandle {
    progress: Receiver<ProgressEvent>,
    worker: JoinHandle<Result<MapSession>>,
}

impl AssemblyHandle {
    /// Progress events of the running assembly.
    ///
    /// The finished session keeps reporting through the same channel, so
    /// later rebuilds show up here too while the handle's receiver lives.
    pub fn progress(&self) -> &Receiver<ProgressEvent> {
        &self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Blocks until the session is built.
    pub fn wait(self) -> Result<MapSession> {
        self.worker
            .join()
            .map_err(|_| MapError::Background("assembly thread panicked".to_string()))?
    }

    /// Blocks until the session is built, returning it with the progress receiver.
    pub fn wait_with_progress(self) -> Result<(MapSession, Receiver<ProgressEvent>)> {
        let progress = self.progress.clone();
        self.wait().map(|session| (session, progress))
    }
}

/// Starts building a [`MapSession`] on a dedicated thread.
///
/// The fetcher moves to the worker and comes back inside the session.
pub fn spawn_session(params: MapParams, fetcher: TileFetcher) -> Result<AssemblyHandle> {
    let (reporter, progress) = ChannelReporter::channel();
    let worker = thread::Builder::new()
        .name("mapstitch-assembly".to_string())
        .spawn(move || {
            let session = MapSession::with_reporter(params, fetcher, reporter);
            if let Err(e) = &session {
                log::error!("background assembly failed: {}", e);
            }
            session
        })?;
    Ok(AssemblyHandle { progress, worker })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FetchConfig;
    use crate::core::geo::{LatLng, ZoomLevel};
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn params() -> MapParams {
        MapParams {
            center: LatLng::new(0.0, 0.0),
            zoom: ZoomLevel::new(15).unwrap(),
            radius_meters: 58.0,
            tile_size: 16,
            display_width: 10,
            display_height: 10,
            ..MapParams::default()
        }
    }

    fn gray_tile(_: &str) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        RgbImage::from_pixel(16, 16, Rgb([90, 90, 90]))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        Ok(bytes)
    }

    #[test]
    fn test_spawned_session_reports_progress() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = TileFetcher::with_transport(&FetchConfig::for_testing(temp_dir.path()), gray_tile);

        let handle = spawn_session(params(), fetcher).unwrap();
        let (session, progress) = handle.wait_with_progress().unwrap();

        assert_eq!(session.composite().tile_count(), 3);
        assert_eq!(session.fetcher_stats().network_fetches, 9);

        let events: Vec<_> = progress.try_iter().collect();
        assert_eq!(events.first(), Some(&ProgressEvent::Started { total: 9 }));
        assert_eq!(events.get(9), Some(&ProgressEvent::Updated { completed: 9 }));
        assert_eq!(events.last(), Some(&ProgressEvent::Stopped));
        assert_eq!(events.len(), 11);
    }

    #[test]
    fn test_assembly_error_is_returned() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = TileFetcher::with_transport(&FetchConfig::for_testing(temp_dir.path()), gray_tile);
        let handle = spawn_session(MapParams { display_width: 0, ..params() }, fetcher).unwrap();
        assert!(matches!(handle.wait(), Err(MapError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_worker_panic_is_background_error() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = TileFetcher::with_transport(
            &FetchConfig::for_testing(temp_dir.path()),
            |_: &str| -> Result<Vec<u8>> { panic!("transport blew up") },
        );
        let handle = spawn_session(params(), fetcher).unwrap();
        assert!(matches!(handle.wait(), Err(MapError::Background(_))));
    }

    #[test]
    fn test_dropped_receiver_does_not_break_reporting() {
        let (mut reporter, receiver) = ChannelReporter::channel();
        drop(receiver);
        reporter.start(4);
        reporter.update(1);
        reporter.stop();
    }
}
