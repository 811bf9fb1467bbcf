mod session;
mod state;
mod ui;

use crate::upload::{DropSorting, FileCollector};
use eframe::{egui, App};
pub use session::UploadSession;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const REPAINT_INTERVAL: Duration = Duration::from_millis(250);

pub struct TagDropApp {
    session: UploadSession,
    collector: FileCollector,
    show_details: bool,
}

impl TagDropApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, mut session: UploadSession) -> Self {
        info!("Initializing TagDrop");
        session.start_polling();
        Self {
            session,
            collector: FileCollector::new(),
            show_details: false,
        }
    }

    /// Collect `paths` and submit one batch per category found.
    pub fn submit_paths(&mut self, paths: &[PathBuf]) {
        let sorting = self.collector.collect(paths);
        self.submit_sorting(sorting);
    }

    fn submit_sorting(&mut self, sorting: DropSorting) {
        if !sorting.skipped.is_empty() {
            warn!("Skipped {} unsupported file(s)", sorting.skipped.len());
        }
        self.session.state_mut().skipped = sorting.skipped.clone();

        for (category, files) in sorting.into_groups() {
            self.session.drop_files(category, files);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let paths: Vec<PathBuf> = dropped.iter().filter_map(|f| f.path.clone()).collect();
        let mut sorting = self.collector.collect(&paths);
        for file in dropped.into_iter().filter(|f| f.path.is_none()) {
            if let Some(bytes) = file.bytes {
                sorting.push(FileCollector::from_bytes(file.name, bytes));
            }
        }
        self.submit_sorting(sorting);
    }
}

impl App for TagDropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        if self.session.pump() {
            ctx.request_repaint();
        }
        self.render(ctx);
        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
