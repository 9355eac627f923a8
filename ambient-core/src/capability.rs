//! OS capability interfaces (§6.E). These are design-level traits only —
//! concrete platform backends (real screen grab, real clipboard, real
//! key-chord synthesis, real hotkey registration, real overlay window) are
//! out of scope for this core pipeline. Each trait follows the donor's
//! `ExternalLLM`/`MemorySystem` shape: `Send + Sync`, `#[async_trait]`, with
//! a debug/null stub implementation for tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{CapabilityError, CaptureError, HotkeyError};

#[derive(Debug, Clone, Copy)]
pub struct DisplayBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A raw, uncompressed RGBA frame as returned by the OS grab primitive.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[async_trait]
pub trait ScreenGrabber: Send + Sync {
    async fn count_displays(&self) -> Result<usize, CaptureError>;
    async fn bounds(&self, display_index: usize) -> Result<DisplayBounds, CaptureError>;
    async fn grab(&self, bounds: DisplayBounds) -> Result<RawImage, CaptureError>;
}

/// Always reports zero displays. Used where no platform backend is wired.
#[derive(Debug, Default)]
pub struct NullScreenGrabber;

#[async_trait]
impl ScreenGrabber for NullScreenGrabber {
    async fn count_displays(&self) -> Result<usize, CaptureError> {
        Ok(0)
    }

    async fn bounds(&self, _display_index: usize) -> Result<DisplayBounds, CaptureError> {
        Err(CaptureError::NoDisplay)
    }

    async fn grab(&self, _bounds: DisplayBounds) -> Result<RawImage, CaptureError> {
        Err(CaptureError::NoDisplay)
    }
}

/// Serves a single fixed in-memory bitmap. Used by tests that need a
/// deterministic, non-empty capture without a real OS backend.
#[derive(Debug, Clone)]
pub struct StaticScreenGrabber {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
impl ScreenGrabber for StaticScreenGrabber {
    async fn count_displays(&self) -> Result<usize, CaptureError> {
        Ok(1)
    }

    async fn bounds(&self, display_index: usize) -> Result<DisplayBounds, CaptureError> {
        if display_index != 0 {
            return Err(CaptureError::NoDisplay);
        }
        Ok(DisplayBounds {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        })
    }

    async fn grab(&self, bounds: DisplayBounds) -> Result<RawImage, CaptureError> {
        let pixel_count = (bounds.width as usize) * (bounds.height as usize) * 4;
        Ok(RawImage {
            width: bounds.width,
            height: bounds.height,
            rgba: vec![128u8; pixel_count],
        })
    }
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn read_text(&self) -> Result<String, CapabilityError>;
    async fn write_text(&self, text: &str) -> Result<(), CapabilityError>;
}

/// In-memory clipboard stand-in. No real OS backend is wired (§6.E); this
/// keeps the C8 flow exercisable without one.
#[derive(Debug, Default)]
pub struct NullClipboard {
    contents: tokio::sync::Mutex<String>,
}

#[async_trait]
impl Clipboard for NullClipboard {
    async fn read_text(&self) -> Result<String, CapabilityError> {
        Ok(self.contents.lock().await.clone())
    }

    async fn write_text(&self, text: &str) -> Result<(), CapabilityError> {
        *self.contents.lock().await = text.to_string();
        Ok(())
    }
}

#[async_trait]
pub trait KeySynth: Send + Sync {
    async fn send_copy(&self) -> Result<(), CapabilityError>;
    async fn send_paste(&self) -> Result<(), CapabilityError>;
}

/// No-op key-chord synthesizer; real platform backends are out of scope.
#[derive(Debug, Default)]
pub struct NullKeySynth;

#[async_trait]
impl KeySynth for NullKeySynth {
    async fn send_copy(&self) -> Result<(), CapabilityError> {
        Ok(())
    }

    async fn send_paste(&self) -> Result<(), CapabilityError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyCombo {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: char,
}

impl std::fmt::Display for HotkeyCombo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.meta {
            write!(f, "Super+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl HotkeyCombo {
    /// `Ctrl+Alt+E`, the primary combo per §4.8.
    pub fn primary() -> Self {
        Self {
            ctrl: true,
            alt: true,
            shift: false,
            meta: false,
            key: 'E',
        }
    }

    /// `Super+Shift+E`, the fallback combo per §4.8.
    pub fn fallback() -> Self {
        Self {
            ctrl: false,
            alt: false,
            shift: true,
            meta: true,
            key: 'E',
        }
    }
}

#[derive(Debug)]
pub struct HotkeyEvent;

#[async_trait]
pub trait HotkeyRegistrar: Send + Sync {
    async fn register(
        &self,
        combo: HotkeyCombo,
    ) -> Result<(HotkeyHandle, mpsc::UnboundedReceiver<HotkeyEvent>), HotkeyError>;
    async fn unregister(&self, handle: HotkeyHandle) -> Result<(), HotkeyError>;
}

/// Always fails registration, forcing callers onto the §4.8 fallback path
/// (and, if both fail, the startup-warning path). Stands in until a real
/// platform backend is wired.
#[derive(Debug, Default)]
pub struct NullHotkeyRegistrar;

#[async_trait]
impl HotkeyRegistrar for NullHotkeyRegistrar {
    async fn register(
        &self,
        combo: HotkeyCombo,
    ) -> Result<(HotkeyHandle, mpsc::UnboundedReceiver<HotkeyEvent>), HotkeyError> {
        Err(HotkeyError::RegistrationFailed {
            combo: combo.to_string(),
            reason: "no platform hotkey backend wired".to_string(),
        })
    }

    async fn unregister(&self, _handle: HotkeyHandle) -> Result<(), HotkeyError> {
        Err(HotkeyError::AlreadyUnregistered)
    }
}

#[async_trait]
pub trait Overlay: Send + Sync {
    /// Shows the overlay at screen coordinates; the returned channel yields
    /// one message per click on the overlay.
    async fn show_at(&self, x: i32, y: i32) -> Result<mpsc::UnboundedReceiver<()>, CapabilityError>;
    async fn hide(&self) -> Result<(), CapabilityError>;
}

/// Accepts show/hide calls without displaying anything; the click channel
/// never yields. Stands in until a real overlay window backend is wired.
#[derive(Debug, Default)]
pub struct NullOverlay;

#[async_trait]
impl Overlay for NullOverlay {
    async fn show_at(&self, _x: i32, _y: i32) -> Result<mpsc::UnboundedReceiver<()>, CapabilityError> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Ok(rx)
    }

    async fn hide(&self) -> Result<(), CapabilityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotkey_combo_renders_plus_joined_chord() {
        assert_eq!(HotkeyCombo::primary().to_string(), "Ctrl+Alt+E");
        assert_eq!(HotkeyCombo::fallback().to_string(), "Shift+Super+E");
    }

    #[tokio::test]
    async fn null_clipboard_round_trips_text() {
        let clipboard = NullClipboard::default();
        clipboard.write_text("hello").await.unwrap();
        assert_eq!(clipboard.read_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn null_hotkey_registrar_always_fails() {
        let registrar = NullHotkeyRegistrar;
        let err = registrar.register(HotkeyCombo::primary()).await.unwrap_err();
        assert!(matches!(err, HotkeyError::RegistrationFailed { .. }));
    }
}
