use super::App;

use tracing::info;

use crate::runner::{build_plan, execute};
use crate::types::OutputPane;

impl App {
    /// Runs the saved file with the active language's toolchain and shows
    /// stderr above stdout in the output pane.
    pub(crate) fn run_current_file(&mut self) {
        let plan = match build_plan(
            self.language.name(),
            self.session.path(),
            &self.config.toolchain,
        ) {
            Ok(plan) => plan,
            Err(err) => return self.show_error(err),
        };
        if self.session.is_dirty() {
            info!("running last saved version; buffer has unsaved edits");
        }
        self.set_status(format!("Running {} ...", plan.language));
        let result = execute(&plan, self.executor.as_mut());
        self.output = OutputPane {
            stdout: result.stdout,
            stderr: result.stderr,
            summary: result.summary,
        };
        self.output_scroll = 0;
        match result.error {
            Some(err) => self.show_error(err),
            None => {
                let note = if self.session.is_dirty() {
                    " (unsaved edits not included)"
                } else {
                    ""
                };
                self.set_status(format!("{}{note}", self.output.summary));
            }
        }
    }
}
