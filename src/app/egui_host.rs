use crate::ui::EguiPanel;
use winit::event::WindowEvent;
use winit::window::Window;

/// Tessellated panel output for one frame.
pub struct PanelFrame {
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
    pub wants_pointer_input: bool,
}

/// Bridges winit input into egui and runs the debug panel.
pub struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
}

impl EguiHost {
    pub fn new(window: &Window) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        Self {
            context,
            winit_state,
        }
    }

    /// Returns true when egui consumed the event.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    pub fn run_panel(&mut self, window: &Window, panel: &mut EguiPanel) -> PanelFrame {
        let raw_input = self.winit_state.take_egui_input(window);
        let full_output = self.context.run(raw_input, |ctx| panel.show(ctx));
        self.winit_state
            .handle_platform_output(window, full_output.platform_output);
        let pixels_per_point = full_output.pixels_per_point;
        PanelFrame {
            clipped_primitives: self.context.tessellate(full_output.shapes, pixels_per_point),
            textures_delta: full_output.textures_delta,
            pixels_per_point,
            wants_pointer_input: self.context.wants_pointer_input(),
        }
    }
}
