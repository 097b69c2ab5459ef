// Main application state and UI rendering logic for the OpenFOAM front-end

// Reusable widgets and status bar sampling
use crate::gui::system_monitor::SystemMonitor;
use crate::gui::{action_button, case_tree, section_header, status_label};
// Settings file and its in-memory copy
use crate::config::ConfigManager;
// Case folder operations, command templates and process control
use crate::foam::{FoamTask, Installation, ProcessHandle, ProcessRunner, case, install, paraview_command};
// Shared data models
use crate::models::{OutputStream, ProcessEvent, StatusMessage, TreeNode};
// Import egui for UI rendering
use eframe::egui;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SHORT: Option<Duration> = Some(Duration::from_millis(2000));
const NORMAL: Option<Duration> = Some(Duration::from_millis(3000));
const LONG: Option<Duration> = Some(Duration::from_millis(5000));

const NO_UNV: &str = "Error: No UNV file selected";
const NO_CASE: &str = "Error: No case selected";

/// The single long-running process (simulation or reconstruction) the user can stop.
struct TrackedProcess {
    handle: ProcessHandle,
    /// Name used in the finish message, e.g. "Simulation"
    label: &'static str,
}

/// Main application state for the eframe app.
/// Holds the selected mesh and case, the editor buffer, terminal output and
/// the handle of the tracked simulation process.
pub struct AppState {
    /// Settings file, updated when the version or solver changes
    config: ConfigManager,

    /// Installations found under the install root
    versions: Vec<String>,

    /// Spawns tools and collects their output
    runner: ProcessRunner,

    /// At most one simulation or reconstruction at a time
    tracked: Option<TrackedProcess>,

    /// Imported UNV mesh
    unv_path: Option<PathBuf>,

    /// File currently loaded in the editor
    editor_path: Option<PathBuf>,

    /// Editor buffer
    editor_text: String,

    /// Terminal output, oldest line first
    output: VecDeque<String>,

    /// Text typed into the terminal input line
    terminal_input: String,

    /// Case directory tree, rebuilt on import and refresh
    tree: Option<TreeNode>,

    /// Transient message on the left of the status bar
    status: Option<StatusMessage>,

    /// CPU and disk readings on the right of the status bar
    monitor: SystemMonitor,
}

impl AppState {
    /// Creates the application state and applies the light theme.
    ///
    /// # Arguments
    /// * `cc` - eframe creation context containing egui context
    /// * `config` - loaded settings
    pub fn new(cc: &eframe::CreationContext<'_>, config: ConfigManager) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        Self::with_config(config, Some(cc.egui_ctx.clone()))
    }

    fn with_config(config: ConfigManager, repaint: Option<egui::Context>) -> Self {
        let settings = config.settings();
        let mut versions = install::detect_versions(&settings.foam.install_root);
        if !versions.contains(&settings.foam.version) {
            versions.push(settings.foam.version.clone());
        }
        let monitor = SystemMonitor::new(Duration::from_millis(settings.ui.monitor_interval_ms.max(100)));

        let mut s = Self {
            config,
            versions,
            runner: ProcessRunner::new(repaint),
            tracked: None,
            unv_path: None,
            editor_path: None,
            editor_text: String::new(),
            output: VecDeque::new(),
            terminal_input: String::new(),
            tree: None,
            status: None,
            monitor,
        };

        if s.config.settings().case.directory.is_some() {
            s.refresh_tree();
        }
        s
    }

    fn installation(&self) -> Installation {
        let foam = &self.config.settings().foam;
        Installation::new(&foam.install_root, &foam.version)
    }

    /// Configured case directory, or the folder of the imported mesh.
    fn case_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.config.settings().case.directory {
            return Some(dir.clone());
        }
        self.unv_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
    }

    fn show_status(&mut self, text: impl Into<String>, timeout: Option<Duration>) {
        self.status = Some(StatusMessage::new(text, timeout));
    }

    fn append_output(&mut self, line: impl Into<String>) {
        self.output.push_back(line.into());
        let limit = self.config.settings().ui.scrollback_lines.max(1);
        while self.output.len() > limit {
            self.output.pop_front();
        }
    }

    fn mesh_label(&self) -> String {
        match self.unv_path.as_ref().and_then(|p| p.file_name()) {
            Some(name) => format!("Mesh: {}", name.to_string_lossy()),
            None => "Mesh: None".to_string(),
        }
    }

    fn save_settings(&self) {
        if !self.config.is_writable() {
            tracing::warn!(
                "Not saving settings: {} could not be read at startup",
                self.config.path().display()
            );
            return;
        }
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save settings to {}: {}", self.config.path().display(), e);
        }
    }

    // ---- process plumbing ----

    /// Launches `task` through the OpenFOAM shell and echoes the command.
    fn start_task(&mut self, task: FoamTask) {
        if task.is_tracked() && self.tracked.is_some() {
            self.show_status("A simulation is already running", NORMAL);
            return;
        }

        let shell = self.config.settings().foam.shell.clone();
        let cmd = task.command(&shell, &self.installation(), self.case_dir().as_deref());
        self.append_output(format!("Command executed: {}", cmd));

        match self.runner.spawn(&cmd) {
            Ok(handle) => {
                if task.is_tracked() {
                    self.tracked = Some(TrackedProcess {
                        handle,
                        label: task.label(),
                    });
                }
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.show_status(format!("Process error: {}", e), LONG);
            }
        }
    }

    fn process_events(&mut self) {
        for event in self.runner.drain() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Output { stream, line, .. } => {
                if stream == OutputStream::Stderr {
                    tracing::debug!("stderr: {}", line);
                }
                self.append_output(line);
            }
            ProcessEvent::Finished { id, code } => {
                let Some(tracked) = self.tracked.take_if(|t| t.handle.id == id) else {
                    return;
                };
                let text = match code {
                    Some(c) => format!("{} finished with code {}", tracked.label, c),
                    None => format!("{} terminated by signal", tracked.label),
                };
                self.show_status(text, LONG);
            }
        }
    }

    // ---- file menu ----

    fn choose_unv(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Choose UNV file")
            .add_filter("UNV files", &["unv"])
            .pick_file();
        if let Some(path) = picked {
            self.import_unv(path);
        }
    }

    fn import_unv(&mut self, path: PathBuf) {
        tracing::info!("Selected mesh {}", path.display());
        self.append_output(format!("UNV file selected: {}", path.display()));
        self.unv_path = Some(path);
        self.show_status("Mesh loaded successfully", NORMAL);
        self.refresh_tree();
    }

    fn refresh_tree(&mut self) {
        let Some(dir) = self.case_dir() else {
            self.show_status(NO_CASE, NORMAL);
            return;
        };
        match case::scan_tree(&dir) {
            Ok(tree) => self.tree = Some(tree),
            Err(e) => {
                self.tree = None;
                self.append_output(e.to_string());
            }
        }
    }

    fn check_mesh(&mut self) {
        if self.unv_path.is_none() {
            self.show_status(NO_UNV, NORMAL);
            return;
        }
        self.show_status("Running checkMesh...", None);
        self.start_task(FoamTask::CheckMesh);
    }

    // ---- tool buttons ----

    fn convert_mesh(&mut self) {
        let Some(unv) = self.unv_path.clone() else {
            self.show_status(NO_UNV, NORMAL);
            return;
        };
        self.show_status("Converting mesh to OpenFOAM...", None);
        self.start_task(FoamTask::ConvertMesh { unv });
    }

    fn decompose(&mut self) {
        if self.unv_path.is_none() {
            self.show_status(NO_UNV, NORMAL);
            return;
        }
        self.show_status("Running decomposePar...", None);
        self.start_task(FoamTask::Decompose);
    }

    fn run_simulation(&mut self) {
        if self.unv_path.is_none() {
            self.show_status(NO_UNV, NORMAL);
            return;
        }
        let foam = &self.config.settings().foam;
        let solver = foam.solver.trim().to_string();
        let processors = foam.processors.max(1);
        if solver.is_empty() {
            self.show_status("Error: No solver selected", NORMAL);
            return;
        }
        if self.tracked.is_none() {
            self.show_status(format!("Starting simulation with {}...", solver), None);
        }
        self.start_task(FoamTask::RunParallel { solver, processors });
    }

    fn stop_simulation(&mut self) {
        let Some(tracked) = &self.tracked else {
            self.show_status("No simulation running", NORMAL);
            return;
        };
        match self.runner.terminate(&tracked.handle) {
            Ok(()) => self.show_status("Simulation stopped", NORMAL),
            Err(e) => {
                tracing::warn!("{}", e);
                self.show_status("No simulation running", NORMAL);
            }
        }
    }

    fn reconstruct(&mut self) {
        if self.unv_path.is_none() {
            self.show_status(NO_UNV, NORMAL);
            return;
        }
        if self.tracked.is_none() {
            self.show_status("Reconstructing case...", None);
        }
        self.start_task(FoamTask::Reconstruct);
    }

    fn clear_processors(&mut self) {
        let Some(dir) = self.case_dir() else {
            self.show_status(NO_CASE, NORMAL);
            return;
        };
        match case::remove_processor_dirs(&dir) {
            Ok(removed) if !removed.is_empty() => {
                for name in removed {
                    self.append_output(format!("Removing folder: {}", name));
                }
                self.show_status("Decomposition folders removed.", NORMAL);
                self.refresh_tree();
            }
            Ok(_) => self.show_status("No decomposition folders found.", NORMAL),
            Err(e) => self.append_output(e.to_string()),
        }
    }

    fn clear_simulation(&mut self) {
        let Some(dir) = self.case_dir() else {
            self.show_status(NO_CASE, NORMAL);
            return;
        };
        match case::remove_time_dirs(&dir) {
            Ok(removed) if !removed.is_empty() => {
                for name in removed {
                    self.append_output(format!("Removing time folder: {}", name));
                }
                self.show_status("Reconstructed time folders removed.", NORMAL);
                self.refresh_tree();
            }
            Ok(_) => self.show_status("No time folders found.", NORMAL),
            Err(e) => self.append_output(e.to_string()),
        }
    }

    fn open_paraview(&mut self) {
        let Some(dir) = self.unv_path.as_ref().and_then(|_| self.case_dir()) else {
            self.show_status(NO_CASE, NORMAL);
            return;
        };
        let pv = &self.config.settings().paraview;
        let cmd = paraview_command(&pv.program, &dir, &pv.foam_file);
        match self.runner.launch_detached(&cmd) {
            Ok(_) => self.show_status("ParaView started successfully", NORMAL),
            Err(e) => {
                tracing::error!("{}", e);
                self.show_status("Error opening ParaView", NORMAL);
            }
        }
    }

    // ---- terminal ----

    fn clear_terminal(&mut self) {
        self.output.clear();
        self.show_status("Terminal cleared", SHORT);
    }

    fn execute_terminal_command(&mut self) {
        let command = std::mem::take(&mut self.terminal_input);
        let command = command.trim();
        if command.is_empty() {
            return;
        }
        self.append_output(format!("> {}", command));

        let shell = self.config.settings().foam.shell.clone();
        let cmd = FoamTask::Custom(command.to_string()).command(
            &shell,
            &self.installation(),
            self.case_dir().as_deref(),
        );
        if let Err(e) = self.runner.spawn(&cmd) {
            tracing::error!("{}", e);
            self.show_status(format!("Process error: {}", e), LONG);
            return;
        }

        let first_word = command.split(' ').next().unwrap_or(command);
        self.show_status(format!("Command executed: {}", first_word), SHORT);
    }

    // ---- OpenFOAM and solver menus ----

    fn set_version(&mut self, version: String) {
        if self.config.settings().foam.version == version {
            return;
        }
        self.config.settings_mut().foam.version = version.clone();
        self.save_settings();
        self.show_status(format!("Selected version: {}", version), NORMAL);
    }

    fn select_solver(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Select solver folder")
            .set_directory(self.installation().solvers_dir())
            .pick_folder();
        if let Some(dir) = picked {
            self.set_solver_dir(&dir);
        }
    }

    fn set_solver_dir(&mut self, dir: &Path) {
        let Some(solver) = install::solver_name(dir) else {
            return;
        };
        self.config.settings_mut().foam.solver = solver.clone();
        self.save_settings();
        self.show_status(format!("Selected solver: {}", solver), NORMAL);
        self.append_output(format!("Solver set: {}", solver));
    }

    // ---- editor ----

    fn edit_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().set_title("Choose code file");
        if let Some(dir) = self.case_dir() {
            dialog = dialog.set_directory(dir.join("system"));
        }
        let picked = dialog.pick_file();
        self.open_for_edit(picked);
    }

    fn open_for_edit(&mut self, picked: Option<PathBuf>) {
        let Some(path) = picked else {
            self.append_output("No file selected.");
            return;
        };
        match case::read_text(&path) {
            Ok(text) => {
                self.editor_text = text;
                self.append_output(format!("Code file opened: {}", path.display()));
                self.editor_path = Some(path);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.append_output("Error opening file for editing.");
            }
        }
    }

    fn load_from_tree(&mut self, path: PathBuf) {
        match case::read_text(&path) {
            Ok(text) => {
                self.editor_text = text;
                self.show_status(format!("File loaded: {}", path.display()), NORMAL);
                self.editor_path = Some(path);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.show_status(format!("Could not open {}", path.display()), NORMAL);
            }
        }
    }

    fn save_file(&mut self) {
        let Some(path) = self.editor_path.clone() else {
            self.append_output("No file loaded to save.");
            return;
        };
        match case::write_text(&path, &self.editor_text) {
            Ok(()) => self.append_output(format!("File saved successfully: {}", path.display())),
            Err(e) => {
                tracing::warn!("{}", e);
                self.append_output("Error saving file.");
            }
        }
    }

    // ---- layout ----

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Refresh Tree").clicked() {
                    ui.close_menu();
                    self.refresh_tree();
                }
                if ui.button("Check Mesh").clicked() {
                    ui.close_menu();
                    self.check_mesh();
                }
                if ui.button("Import File (.unv)").clicked() {
                    ui.close_menu();
                    self.choose_unv();
                }
            });

            ui.menu_button("Terminal", |ui| {
                if ui.button("Clear Terminal").clicked() {
                    ui.close_menu();
                    self.clear_terminal();
                }
            });

            ui.menu_button("OpenFOAM", |ui| {
                let current = self.config.settings().foam.version.clone();
                let mut chosen = None;
                egui::ComboBox::from_label("Version")
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for v in &self.versions {
                            if ui.selectable_label(*v == current, v.as_str()).clicked() {
                                chosen = Some(v.clone());
                            }
                        }
                    });
                if let Some(v) = chosen {
                    self.set_version(v);
                }
            });

            ui.menu_button("Solver", |ui| {
                if ui.button("Select Solver...").clicked() {
                    ui.close_menu();
                    self.select_solver();
                }
            });
        });
    }

    fn status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(msg) = &self.status {
                ui.label(egui::RichText::new(&msg.text).size(12.0));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                status_label(ui, &self.monitor.disk_label());
                status_label(ui, &self.monitor.cpu_label());
                status_label(ui, &self.mesh_label());
            });
        });
    }

    fn terminal_column(&mut self, ui: &mut egui::Ui) {
        section_header(ui, "Terminal and Logs");

        if action_button(ui, "Open in ParaView") {
            self.open_paraview();
        }
        ui.add_space(4.0);

        // leave room for the input line and the seven action buttons
        let output_height = (ui.available_height() - 260.0).max(120.0);
        egui::Frame::none()
            .fill(egui::Color32::from_gray(28))
            .rounding(6.0)
            .inner_margin(6.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let row_height = ui.text_style_height(&egui::TextStyle::Monospace);
                ui.push_id("terminal_output", |ui| {
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .stick_to_bottom(true)
                        .max_height(output_height)
                        .min_scrolled_height(output_height)
                        .show_rows(ui, row_height, self.output.len(), |ui, rows| {
                            for line in self.output.range(rows) {
                                ui.label(
                                    egui::RichText::new(line)
                                        .monospace()
                                        .color(egui::Color32::from_gray(220)),
                                );
                            }
                        });
                });
            });

        ui.add_space(4.0);
        let input = ui.add(
            egui::TextEdit::singleline(&mut self.terminal_input)
                .hint_text(">>")
                .font(egui::TextStyle::Monospace)
                .desired_width(f32::INFINITY),
        );
        if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.execute_terminal_command();
            input.request_focus();
        }
        ui.add_space(4.0);

        if action_button(ui, "Convert Mesh") {
            self.convert_mesh();
        }
        if action_button(ui, "Decompose Cores") {
            self.decompose();
        }
        if action_button(ui, "Run Simulation") {
            self.run_simulation();
        }
        if action_button(ui, "Stop Simulation") {
            self.stop_simulation();
        }
        if action_button(ui, "Reconstruct") {
            self.reconstruct();
        }
        if action_button(ui, "Clear Processors") {
            self.clear_processors();
        }
        if action_button(ui, "Clear Simulation Files") {
            self.clear_simulation();
        }
    }

    fn editor_column(&mut self, ui: &mut egui::Ui) {
        section_header(ui, "File Editor");

        let current = self
            .editor_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "No file open".to_string());
        ui.label(egui::RichText::new(current).size(11.0).color(egui::Color32::from_gray(110)));

        let editor_height = (ui.available_height() - 70.0).max(120.0);
        ui.push_id("file_editor", |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .max_height(editor_height)
                .min_scrolled_height(editor_height)
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.editor_text)
                            .code_editor()
                            .desired_width(f32::INFINITY)
                            .desired_rows(30),
                    );
                });
        });

        ui.add_space(4.0);
        if action_button(ui, "Edit File") {
            self.edit_file();
        }
        if action_button(ui, "Save File") {
            self.save_file();
        }
    }

    fn tree_column(&mut self, ui: &mut egui::Ui) {
        section_header(ui, "Directories");

        let mut opened = None;
        ui.push_id("case_tree", |ui| {
            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .show(ui, |ui| match &self.tree {
                    Some(tree) => opened = case_tree(ui, tree),
                    None => {
                        ui.label(
                            egui::RichText::new("Import a mesh to browse its case")
                                .color(egui::Color32::from_gray(130)),
                        );
                    }
                });
        });

        if let Some(path) = opened {
            self.load_from_tree(path);
        }
    }
}

impl eframe::App for AppState {
    /// Main UI update function called every frame.
    /// Drains process output, refreshes the status bar readings and draws the panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Wake up at least once per monitor interval
        ctx.request_repaint_after(self.monitor.interval());

        self.process_events();

        let now = Instant::now();
        self.monitor.poll_if_due(now);
        if self.status.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.status = None;
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| self.menu_bar(ui));

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(2.0);
            self.status_bar(ui);
            ui.add_space(2.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(3, |cols| {
                self.terminal_column(&mut cols[0]);
                self.editor_column(&mut cols[1]);
                self.tree_column(&mut cols[2]);
            });
        });
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Some(tracked) = self.tracked.take() {
            tracing::info!("Stopping {} before exit", tracked.label);
            if let Err(e) = self.runner.terminate(&tracked.handle) {
                tracing::debug!("{}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        case: PathBuf,
        app: AppState,
    }

    /// App with an empty install root and a case folder holding a mesh.
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("opt");
        let case = dir.path().join("tank");
        fs::create_dir_all(root.join("openfoam9").join("etc")).unwrap();
        fs::write(root.join("openfoam9").join("etc").join("bashrc"), "").unwrap();
        fs::create_dir_all(case.join("system")).unwrap();
        fs::write(case.join("system").join("controlDict"), "endTime 1;\n").unwrap();
        fs::write(case.join("tank.unv"), "").unwrap();

        let mut config = ConfigManager::new(dir.path().join("settings.toml"));
        config.settings_mut().foam.install_root = root;
        let app = AppState::with_config(config, None);

        Fixture {
            _dir: dir,
            case,
            app,
        }
    }

    fn status(app: &AppState) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    fn fake_tracked(app: &mut AppState, id: u64) {
        app.tracked = Some(TrackedProcess {
            handle: ProcessHandle { id, pid: 0 },
            label: "Simulation",
        });
    }

    #[test]
    fn tools_require_a_mesh() {
        let mut f = fixture();
        let actions: [fn(&mut AppState); 5] = [
            AppState::check_mesh,
            AppState::convert_mesh,
            AppState::decompose,
            AppState::run_simulation,
            AppState::reconstruct,
        ];
        for action in actions {
            f.app.status = None;
            action(&mut f.app);
            assert_eq!(status(&f.app), NO_UNV);
        }
        assert!(f.app.output.is_empty());
        assert!(f.app.tracked.is_none());

        f.app.open_paraview();
        assert_eq!(status(&f.app), NO_CASE);
    }

    #[test]
    fn importing_a_mesh_builds_the_tree() {
        let mut f = fixture();
        let unv = f.case.join("tank.unv");
        f.app.import_unv(unv.clone());

        assert_eq!(f.app.mesh_label(), "Mesh: tank.unv");
        assert_eq!(status(&f.app), "Mesh loaded successfully");
        assert_eq!(
            f.app.output.back().unwrap(),
            &format!("UNV file selected: {}", unv.display())
        );
        let tree = f.app.tree.as_ref().unwrap();
        assert_eq!(tree.name, "tank");
        assert_eq!(tree.children[0].name, "system");
        assert_eq!(f.app.case_dir(), Some(f.case.clone()));
    }

    #[test]
    fn configured_case_directory_wins() {
        let mut f = fixture();
        f.app.config.settings_mut().case.directory = Some(PathBuf::from("/srv/cases/pipe"));
        f.app.unv_path = Some(f.case.join("tank.unv"));
        assert_eq!(f.app.case_dir(), Some(PathBuf::from("/srv/cases/pipe")));
    }

    #[test]
    fn missing_case_is_reported_in_terminal() {
        let mut f = fixture();
        let gone = f.case.join("gone").join("mesh.unv");
        f.app.import_unv(gone);
        assert!(f.app.tree.is_none());
        assert!(f.app.output.back().unwrap().starts_with("Case directory not found:"));
    }

    #[test]
    fn stop_without_simulation() {
        let mut f = fixture();
        f.app.stop_simulation();
        assert_eq!(status(&f.app), "No simulation running");
    }

    #[test]
    fn only_one_tracked_process() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));
        fake_tracked(&mut f.app, 99);

        f.app.run_simulation();
        assert_eq!(status(&f.app), "A simulation is already running");
        f.app.reconstruct();
        assert_eq!(status(&f.app), "A simulation is already running");
        assert_eq!(f.app.tracked.as_ref().unwrap().handle.id, 99);
        assert!(f.app.output.is_empty());
        f.app.tracked = None;
    }

    #[test]
    fn finishing_the_tracked_process_frees_the_slot() {
        let mut f = fixture();
        fake_tracked(&mut f.app, 7);

        f.app.handle_event(ProcessEvent::Output {
            id: 7,
            stream: OutputStream::Stdout,
            line: "Time = 0.1".to_string(),
        });
        f.app.handle_event(ProcessEvent::Finished { id: 3, code: Some(0) });
        assert!(f.app.tracked.is_some());

        f.app.handle_event(ProcessEvent::Finished { id: 7, code: Some(1) });
        assert!(f.app.tracked.is_none());
        assert_eq!(status(&f.app), "Simulation finished with code 1");
        assert_eq!(f.app.output.back().unwrap(), "Time = 0.1");
    }

    #[test]
    fn editor_open_and_save() {
        let mut f = fixture();
        f.app.save_file();
        assert_eq!(f.app.output.back().unwrap(), "No file loaded to save.");

        f.app.open_for_edit(None);
        assert_eq!(f.app.output.back().unwrap(), "No file selected.");

        let dict = f.case.join("system").join("controlDict");
        f.app.open_for_edit(Some(dict.clone()));
        assert_eq!(f.app.editor_text, "endTime 1;\n");

        f.app.editor_text = "endTime 5;\n".to_string();
        f.app.save_file();
        assert_eq!(fs::read_to_string(&dict).unwrap(), "endTime 5;\n");
        assert_eq!(
            f.app.output.back().unwrap(),
            &format!("File saved successfully: {}", dict.display())
        );

        f.app.open_for_edit(Some(f.case.join("system").join("missing")));
        assert_eq!(f.app.output.back().unwrap(), "Error opening file for editing.");
    }

    #[test]
    fn tree_double_click_loads_file() {
        let mut f = fixture();
        let dict = f.case.join("system").join("controlDict");
        f.app.load_from_tree(dict.clone());
        assert_eq!(f.app.editor_path, Some(dict.clone()));
        assert_eq!(status(&f.app), format!("File loaded: {}", dict.display()));
    }

    #[test]
    fn cleanup_buttons() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));

        f.app.clear_processors();
        assert_eq!(status(&f.app), "No decomposition folders found.");

        fs::create_dir(f.case.join("processor0")).unwrap();
        fs::create_dir(f.case.join("0.2")).unwrap();
        fs::create_dir(f.case.join("0")).unwrap();

        f.app.clear_processors();
        assert_eq!(status(&f.app), "Decomposition folders removed.");
        assert!(f.app.output.contains(&"Removing folder: processor0".to_string()));

        f.app.clear_simulation();
        assert_eq!(status(&f.app), "Reconstructed time folders removed.");
        assert!(f.case.join("0").exists());
        assert!(!f.case.join("0.2").exists());

        f.app.clear_simulation();
        assert_eq!(status(&f.app), "No time folders found.");
    }

    #[test]
    fn version_and_solver_are_persisted() {
        let mut f = fixture();
        f.app.set_version("openfoam11".to_string());
        assert_eq!(status(&f.app), "Selected version: openfoam11");

        f.app.set_solver_dir(Path::new("/opt/openfoam11/applications/solvers/multiphase/interFoam"));
        assert_eq!(f.app.output.back().unwrap(), "Solver set: interFoam");

        let mut reloaded = ConfigManager::new(f.app.config.path());
        reloaded.load_or_create().unwrap();
        assert_eq!(reloaded.settings().foam.version, "openfoam11");
        assert_eq!(reloaded.settings().foam.solver, "interFoam");
    }

    #[test]
    fn scrollback_is_bounded() {
        let mut f = fixture();
        f.app.config.settings_mut().ui.scrollback_lines = 3;
        for i in 0..5 {
            f.app.append_output(format!("line {}", i));
        }
        let lines: Vec<&str> = f.app.output.iter().map(String::as_str).collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);

        f.app.clear_terminal();
        assert!(f.app.output.is_empty());
        assert_eq!(status(&f.app), "Terminal cleared");
    }

    #[test]
    fn terminal_command_runs_in_foam_shell() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));
        f.app.terminal_input = "echo \"$FOAM_RUN\" && pwd".to_string();
        f.app.execute_terminal_command();

        assert!(f.app.terminal_input.is_empty());
        assert_eq!(status(&f.app), "Command executed: echo");
        assert_eq!(f.app.output[0], "> echo \"$FOAM_RUN\" && pwd");

        let prefix = f.app.installation().prefix().display().to_string();
        let mut saw_prefix = false;
        loop {
            match f.app.runner.wait_event(Duration::from_secs(10)) {
                Some(ProcessEvent::Finished { code, .. }) => {
                    assert_eq!(code, Some(0));
                    break;
                }
                Some(ProcessEvent::Output { line, .. }) => saw_prefix |= line == prefix,
                None => panic!("terminal command did not finish"),
            }
        }
        assert!(saw_prefix);
    }

    /// Feeds runner events into the app until a process finishes.
    fn run_until_finished(app: &mut AppState) {
        loop {
            match app.runner.wait_event(Duration::from_secs(10)) {
                Some(event) => {
                    let done = matches!(event, ProcessEvent::Finished { .. });
                    app.handle_event(event);
                    if done {
                        return;
                    }
                }
                None => panic!("process did not finish"),
            }
        }
    }

    #[test]
    fn simulation_is_tracked_until_it_exits() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));

        f.app.run_simulation();
        let handle = f.app.tracked.as_ref().unwrap().handle.clone();
        assert!(handle.pid > 1);
        assert_eq!(f.app.tracked.as_ref().unwrap().label, "Simulation");
        assert!(f.app.output[0].starts_with("Command executed: bash -l -c"));
        assert!(f.app.output[0].contains("mpirun -np 6 twoLiquidMixingFoam -parallel"));

        f.app.reconstruct();
        assert_eq!(status(&f.app), "A simulation is already running");
        assert_eq!(f.app.tracked.as_ref().unwrap().handle, handle);

        run_until_finished(&mut f.app);
        assert!(f.app.tracked.is_none());
        assert!(status(&f.app).starts_with("Simulation finished with code "));
    }

    #[test]
    fn reconstruction_is_tracked_until_it_exits() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));

        f.app.reconstruct();
        assert_eq!(status(&f.app), "Reconstructing case...");
        assert_eq!(f.app.tracked.as_ref().unwrap().label, "Reconstruction");

        run_until_finished(&mut f.app);
        assert!(f.app.tracked.is_none());
        assert!(status(&f.app).starts_with("Reconstruction finished with code "));
    }

    #[test]
    fn stopping_a_running_simulation() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));
        // the sourced environment keeps the shell busy until it is stopped
        fs::write(f.app.installation().bashrc(), "sleep 30\n").unwrap();

        f.app.run_simulation();
        assert!(f.app.tracked.is_some());

        f.app.stop_simulation();
        assert_eq!(status(&f.app), "Simulation stopped");

        run_until_finished(&mut f.app);
        assert!(f.app.tracked.is_none());
        assert_eq!(status(&f.app), "Simulation terminated by signal");

        f.app.stop_simulation();
        assert_eq!(status(&f.app), "No simulation running");
    }

    #[test]
    fn spawn_failure_is_shown_for_five_seconds() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));
        f.app.config.settings_mut().foam.shell = "/nonexistent/bash".to_string();

        f.app.run_simulation();
        assert!(f.app.tracked.is_none());
        assert!(status(&f.app).starts_with("Process error: failed to start /nonexistent/bash"));
        assert!(f.app.output[0].starts_with("Command executed: /nonexistent/bash"));

        let msg = f.app.status.as_ref().unwrap();
        let now = Instant::now();
        assert!(!msg.is_expired(now + Duration::from_secs(4)));
        assert!(msg.is_expired(now + Duration::from_secs(6)));
    }

    #[test]
    fn paraview_start_and_failure() {
        let mut f = fixture();
        f.app.unv_path = Some(f.case.join("tank.unv"));

        f.app.config.settings_mut().paraview.program = "true".to_string();
        f.app.open_paraview();
        assert_eq!(status(&f.app), "ParaView started successfully");

        f.app.config.settings_mut().paraview.program = "/nonexistent/paraview".to_string();
        f.app.open_paraview();
        assert_eq!(status(&f.app), "Error opening ParaView");
        assert!(f.app.tracked.is_none());
    }

    #[test]
    fn unreadable_settings_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let original = "[foam]\nprocessors = 12\nbad line here\n";
        fs::write(&path, original).unwrap();

        let mut config = ConfigManager::new(&path);
        assert!(config.load_or_create().is_err());
        config.settings_mut().foam.install_root = dir.path().join("opt");
        let mut app = AppState::with_config(config, None);

        app.set_version("openfoam11".to_string());
        app.set_solver_dir(Path::new("/opt/openfoam11/applications/solvers/multiphase/interFoam"));
        assert_eq!(app.config.settings().foam.solver, "interFoam");
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }
}
