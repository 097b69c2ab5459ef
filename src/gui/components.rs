    use crate::models::TreeNode;
    use eframe::egui;
    use std::path::PathBuf;

    pub fn section_header(ui: &mut egui::Ui, title: &str) {
        ui.label(egui::RichText::new(title).size(14.0).strong());
        ui.add_space(4.0);
    }

    /// Full-width button used for the tool actions in the terminal column.
    pub fn action_button(ui: &mut egui::Ui, label: &str) -> bool {
        ui.add_sized([ui.available_width(), 24.0], egui::Button::new(label))
            .clicked()
    }

    pub fn status_label(ui: &mut egui::Ui, text: &str) {
        egui::Frame::none()
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(210)))
            .rounding(4.0)
            .inner_margin(egui::vec2(6.0, 2.0))
            .show(ui, |ui| {
                ui.label(egui::RichText::new(text).size(11.0).color(egui::Color32::from_gray(70)));
            });
    }

    /// Draws the case tree fully expanded and returns the file that was double-clicked.
    pub fn case_tree(ui: &mut egui::Ui, node: &TreeNode) -> Option<PathBuf> {
        let mut opened = None;
        ui.push_id(&node.path, |ui| {
            if node.is_dir() {
                egui::CollapsingHeader::new(format!("📁 {}", node.name))
                    .default_open(true)
                    .show(ui, |ui| {
                        for child in &node.children {
                            if let Some(p) = case_tree(ui, child) {
                                opened = Some(p);
                            }
                        }
                    });
            } else {
                let response = ui.add(
                    egui::Label::new(format!("📄 {}", node.name)).sense(egui::Sense::click()),
                );
                if response.double_clicked() {
                    opened = Some(node.path.clone());
                }
                response.on_hover_text(node.path.display().to_string());
            }
        });
        opened
    }
