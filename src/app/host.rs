use crate::viewport::ViewportMetrics;
use winit::dpi::LogicalSize;
use winit::window::Window;

/// Window the scene is presented in.
pub trait Host {
    /// Drawable area in logical pixels.
    fn logical_size(&self) -> (u32, u32);
    fn device_pixel_ratio(&self) -> f64;
    fn request_frame(&self);

    fn viewport_metrics(&self) -> ViewportMetrics {
        let (width, height) = self.logical_size();
        ViewportMetrics {
            width,
            height,
            device_pixel_ratio: self.device_pixel_ratio(),
        }
    }
}

impl Host for Window {
    fn logical_size(&self) -> (u32, u32) {
        let size: LogicalSize<f64> = self.inner_size().to_logical(self.scale_factor());
        (size.width.round() as u32, size.height.round() as u32)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.scale_factor()
    }

    fn request_frame(&self) {
        self.request_redraw();
    }
}
