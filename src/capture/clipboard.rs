//! System clipboard access
//!
//! Thin trait over the OS clipboard so the poller can be driven by a fake
//! in tests. The arboard-backed implementation normalizes "nothing there"
//! to `Ok(None)` and reserves `Err` for genuine read failures, which abandon
//! the poll tick. Images are folded into the text pipeline as PNG data URIs.

use anyhow::{Context, Result};
use arboard::Clipboard;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

/// Clipboard operations the capture pipeline needs.
///
/// Implementations are not required to be Send: the OS clipboard handle
/// stays on the thread that created it.
pub trait SystemClipboard {
    /// Current clipboard text. `Ok(None)` when the clipboard holds no text.
    fn read_text(&mut self) -> Result<Option<String>>;
    /// Current clipboard image as a PNG data URI. `Ok(None)` when the
    /// clipboard holds no image.
    fn read_image(&mut self) -> Result<Option<String>>;
    /// Replace the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// arboard-backed implementation.
pub struct ArboardClipboard {
    inner: Clipboard,
}

impl ArboardClipboard {
    pub fn new() -> Result<Self> {
        let inner = Clipboard::new().context("Failed to create clipboard instance")?;
        Ok(ArboardClipboard { inner })
    }
}

impl SystemClipboard for ArboardClipboard {
    fn read_text(&mut self) -> Result<Option<String>> {
        match self.inner.get_text() {
            Ok(text) if text.is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(e).context("Clipboard text read failed"),
        }
    }

    fn read_image(&mut self) -> Result<Option<String>> {
        match self.inner.get_image() {
            Ok(image_data) => {
                let uri = encode_rgba_as_data_uri(
                    &image_data.bytes,
                    image_data.width as u32,
                    image_data.height as u32,
                )?;
                Ok(Some(uri))
            }
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(e).context("Clipboard image read failed"),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_string())
            .context("Clipboard text write failed")
    }
}

/// Encode raw RGBA pixels as a `data:image/png;base64,` URI.
///
/// Stored inline so image items flow through the same string-keyed dedup
/// and persistence path as text.
pub fn encode_rgba_as_data_uri(rgba: &[u8], width: u32, height: u32) -> Result<String> {
    let mut png_bytes: Vec<u8> = Vec::new();
    PngEncoder::new(&mut png_bytes)
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .context("Failed to encode clipboard image as PNG")?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
    debug!(
        width,
        height,
        png_bytes = png_bytes.len(),
        "Encoded clipboard image"
    );
    Ok(format!("data:image/png;base64,{}", encoded))
}

/// Scriptable clipboard for tests: a queue of states the poller will see.
#[cfg(test)]
#[derive(Default)]
pub struct FakeClipboard {
    pub text: Option<String>,
    pub image: Option<String>,
    pub fail_reads: bool,
    pub written: Vec<String>,
}

#[cfg(test)]
impl SystemClipboard for FakeClipboard {
    fn read_text(&mut self) -> Result<Option<String>> {
        if self.fail_reads {
            anyhow::bail!("simulated clipboard failure");
        }
        Ok(self.text.clone())
    }

    fn read_image(&mut self) -> Result<Option<String>> {
        if self.fail_reads {
            anyhow::bail!("simulated clipboard failure");
        }
        Ok(self.image.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.written.push(text.to_string());
        self.text = Some(text.to_string());
        Ok(())
    }
}

/// Shared handle so tests can mutate the fake while the poller owns it.
#[cfg(test)]
impl SystemClipboard for std::sync::Arc<parking_lot::Mutex<FakeClipboard>> {
    fn read_text(&mut self) -> Result<Option<String>> {
        self.lock().read_text()
    }

    fn read_image(&mut self) -> Result<Option<String>> {
        self.lock().read_image()
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.lock().write_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rgba_produces_data_uri() {
        // 2x2 opaque red square
        let rgba = [255u8, 0, 0, 255].repeat(4);
        let uri = encode_rgba_as_data_uri(&rgba, 2, 2).expect("encode should succeed");
        assert!(uri.starts_with("data:image/png;base64,"));
        // PNG magic encodes to the well-known base64 prefix
        assert!(uri.contains("iVBORw0KGgo"));
    }

    #[test]
    fn test_encode_rejects_mismatched_dimensions() {
        let rgba = [0u8; 4];
        assert!(encode_rgba_as_data_uri(&rgba, 2, 2).is_err());
    }

    #[test]
    fn test_fake_clipboard_write_updates_text() {
        let mut clipboard = FakeClipboard::default();
        clipboard.write_text("hello").expect("write");
        assert_eq!(clipboard.read_text().expect("read"), Some("hello".to_string()));
        assert_eq!(clipboard.written, vec!["hello".to_string()]);
    }

    #[test]
    fn test_fake_clipboard_failure_mode() {
        let mut clipboard = FakeClipboard {
            fail_reads: true,
            ..Default::default()
        };
        assert!(clipboard.read_text().is_err());
    }
}
