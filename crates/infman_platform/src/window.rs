use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// Window title and logical size. The game lays out everything in this size;
/// the window is fixed so the layout never has to reflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl PlatformConfig {
    pub fn new(title: impl Into<String>, (width, height): (u32, u32)) -> Self {
        Self {
            title: title.into(),
            width,
            height,
        }
    }

    pub fn logical_size(&self) -> LogicalSize<u32> {
        LogicalSize::new(self.width, self.height)
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, OsError> {
    let attrs = WindowAttributes::default()
        .with_title(config.title.clone())
        .with_inner_size(config.logical_size())
        .with_resizable(false);

    let window = event_loop.create_window(attrs)?;
    log::info!(
        "Window created: '{}' {}x{}",
        config.title,
        config.width,
        config.height
    );
    Ok(Arc::new(window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_keeps_logical_size() {
        let config = PlatformConfig::new("INF-MAN", (1200, 600));
        assert_eq!(config.logical_size(), LogicalSize::new(1200, 600));
        assert_eq!(config.title, "INF-MAN");
    }
}
