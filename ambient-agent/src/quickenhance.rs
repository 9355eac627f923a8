//! Quick-enhance controller (C8, §4.8): lets the user enhance selected
//! text anywhere on the OS via a hotkey, without leaving the foreground
//! app. Orchestrates the capability traits from `ambient_core::capability`
//! the same way the donor wires its `ExternalLLM`/`MemorySystem` traits
//! (`pagi-companion-core/src/agent/mod.rs`).

use std::sync::Arc;
use std::time::Duration;

use ambient_core::capability::{Clipboard, HotkeyCombo, HotkeyRegistrar, KeySynth, Overlay};
use ambient_core::error::CapabilityError;
use tokio::sync::Mutex;
use tracing::warn;

const COPY_SETTLE_DELAY: Duration = Duration::from_millis(100);
const CLIPBOARD_RESTORE_DELAY: Duration = Duration::from_millis(200);

pub struct QuickEnhanceController {
    clipboard: Arc<dyn Clipboard>,
    key_synth: Arc<dyn KeySynth>,
    overlay: Arc<dyn Overlay>,
    /// §5 "Clipboard is a globally-shared OS resource": serializes the
    /// save→use→restore sequence so concurrent invocations don't race.
    lock: Mutex<()>,
}

impl QuickEnhanceController {
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        key_synth: Arc<dyn KeySynth>,
        overlay: Arc<dyn Overlay>,
    ) -> Self {
        Self {
            clipboard,
            key_synth,
            overlay,
            lock: Mutex::new(()),
        }
    }

    /// §4.8 steps 1-4: capture the user's current selection into the
    /// clipboard, returning it, while restoring the user's prior clipboard
    /// contents in the background.
    pub async fn capture_selection(&self) -> Result<String, CapabilityError> {
        let Ok(_guard) = self.lock.try_lock() else {
            // §5: overlapping invocations drop the second.
            return Err(CapabilityError("quick-enhance already in progress".to_string()));
        };

        let saved = self.clipboard.read_text().await.ok();

        self.clipboard.write_text("").await?;
        self.key_synth.send_copy().await?;
        tokio::time::sleep(COPY_SETTLE_DELAY).await;

        let selected = self.clipboard.read_text().await?;

        if let Some(saved) = saved {
            let clipboard = self.clipboard.clone();
            tokio::spawn(async move {
                tokio::time::sleep(CLIPBOARD_RESTORE_DELAY).await;
                if let Err(e) = clipboard.write_text(&saved).await {
                    warn!(error = %e, "failed to restore clipboard after quick-enhance capture");
                }
            });
        }

        Ok(selected)
    }

    /// §4.8 step 6: paste the enhanced text into the foreground app, then
    /// restore the user's prior clipboard contents.
    pub async fn paste_enhanced(&self, enhanced_text: &str) -> Result<(), CapabilityError> {
        let _guard = self.lock.lock().await;

        let saved = self.clipboard.read_text().await.ok();

        self.clipboard.write_text(enhanced_text).await?;
        self.key_synth.send_paste().await?;

        if let Some(saved) = saved {
            let clipboard = self.clipboard.clone();
            tokio::spawn(async move {
                tokio::time::sleep(CLIPBOARD_RESTORE_DELAY).await;
                if let Err(e) = clipboard.write_text(&saved).await {
                    warn!(error = %e, "failed to restore clipboard after quick-enhance paste");
                }
            });
        }

        Ok(())
    }

    pub async fn show_overlay_near_cursor(&self, x: i32, y: i32) -> Result<tokio::sync::mpsc::UnboundedReceiver<()>, CapabilityError> {
        self.overlay.show_at(x, y).await
    }
}

/// §4.8 "Hotkey choice": try the primary combo, fall back to the secondary,
/// and surface only a warning (never fatal) if both fail.
pub async fn register_hotkeys(
    registrar: &dyn HotkeyRegistrar,
) -> Option<(ambient_core::capability::HotkeyHandle, tokio::sync::mpsc::UnboundedReceiver<ambient_core::capability::HotkeyEvent>)> {
    match registrar.register(HotkeyCombo::primary()).await {
        Ok(registration) => return Some(registration),
        Err(e) => warn!(error = %e, combo = %HotkeyCombo::primary(), "primary hotkey registration failed"),
    }

    match registrar.register(HotkeyCombo::fallback()).await {
        Ok(registration) => return Some(registration),
        Err(e) => warn!(error = %e, combo = %HotkeyCombo::fallback(), "fallback hotkey registration failed"),
    }

    warn!("both hotkey combos failed to register; HTTP and UI paths still work");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc;

    struct FakeClipboard {
        contents: StdMutex<String>,
    }

    #[async_trait]
    impl Clipboard for FakeClipboard {
        async fn read_text(&self) -> Result<String, CapabilityError> {
            Ok(self.contents.lock().unwrap().clone())
        }

        async fn write_text(&self, text: &str) -> Result<(), CapabilityError> {
            *self.contents.lock().unwrap() = text.to_string();
            Ok(())
        }
    }

    /// Simulates the foreground app responding to the synthesized
    /// shortcut by writing `reply` into the shared clipboard.
    struct FakeKeySynth {
        clipboard: Arc<FakeClipboard>,
        reply: String,
    }

    #[async_trait]
    impl KeySynth for FakeKeySynth {
        async fn send_copy(&self) -> Result<(), CapabilityError> {
            self.clipboard.write_text(&self.reply).await
        }
        async fn send_paste(&self) -> Result<(), CapabilityError> {
            Ok(())
        }
    }

    struct FakeOverlay;

    #[async_trait]
    impl Overlay for FakeOverlay {
        async fn show_at(&self, _x: i32, _y: i32) -> Result<mpsc::UnboundedReceiver<()>, CapabilityError> {
            let (_tx, rx) = mpsc::unbounded_channel();
            Ok(rx)
        }
        async fn hide(&self) -> Result<(), CapabilityError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn capture_selection_reads_post_copy_clipboard() {
        let clipboard = Arc::new(FakeClipboard {
            contents: StdMutex::new("old clipboard".to_string()),
        });
        let key_synth = Arc::new(FakeKeySynth {
            clipboard: clipboard.clone(),
            reply: "selected text".to_string(),
        });
        let controller = QuickEnhanceController::new(clipboard, key_synth, Arc::new(FakeOverlay));

        let selected = controller.capture_selection().await.unwrap();
        assert_eq!(selected, "selected text");
    }
}
