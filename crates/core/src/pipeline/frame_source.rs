use crate::shared::frame::Frame;

/// Supplies frames to the live loop in stream order.
///
/// `Ok(None)` signals a clean end of stream. An `Err` is a fatal read
/// failure; there is no retry, since re-reading a live frame is
/// meaningless.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
