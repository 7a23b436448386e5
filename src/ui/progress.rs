use crate::ui::progress_message::{ProgressMessage, ProgressPhase};
use crate::ui::{is_quiet, theme};
use indicatif::{HumanDuration, MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

/// Progress bars driven by [`ProgressMessage`]s from scan workers.
///
/// Messages arrive over a crossbeam channel and are rendered on a dedicated
/// thread, so workers never block on the terminal. Bars are hidden when stdout
/// is not a terminal.
pub struct ProgressManager {
    mp: MultiProgress,
    walking: ProgressBar,
    writing: ProgressBar,
    handle: Option<thread::JoinHandle<usize>>,
}

impl ProgressManager {
    pub fn new() -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();
        let is_term = console::Term::stdout().is_term() && !is_quiet();

        let mp = MultiProgress::new();
        let walking = if is_term {
            let bar = mp.add(ProgressBar::new(0).with_message("Walking sources"));
            if let Ok(style) = ProgressStyle::with_template("{spinner} {bar:30} {pos}/{len} {wide_msg}") {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        let writing = if is_term {
            mp.add(ProgressBar::new_spinner().with_message("Writing model"))
        } else {
            ProgressBar::hidden()
        };

        let walking_clone = walking.clone();
        let writing_clone = writing.clone();

        // Returns the number of skipped files once every sender is dropped
        let handle = thread::spawn(move || {
            let mut skipped = 0;
            for msg in rx {
                match msg {
                    ProgressMessage::Started {
                        phase: ProgressPhase::Walking,
                        total,
                    } => walking_clone.set_length(total as u64),
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Walking,
                        file,
                    } => {
                        walking_clone.inc(1);
                        if let Some(f) = file {
                            walking_clone.set_message(f);
                        }
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Walking,
                    } => walking_clone.finish_with_message("Done"),
                    ProgressMessage::Started {
                        phase: ProgressPhase::Writing,
                        ..
                    } => writing_clone.enable_steady_tick(Duration::from_millis(100)),
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Writing,
                    } => writing_clone.finish_with_message("Done"),
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Writing,
                        ..
                    } => writing_clone.tick(),
                    ProgressMessage::Skipped(_) => skipped += 1,
                }
            }
            skipped
        });

        (
            Self {
                mp,
                walking,
                writing,
                handle: Some(handle),
            },
            tx,
        )
    }

    /// Wait for the render thread. Every sender must have been dropped.
    pub fn join(&mut self) -> usize {
        self.handle
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.walking.finish_and_clear();
        self.writing.finish_and_clear();
        self.mp.clear().ok();
    }

    pub fn finish_with_summary(&self, duration: Duration, files: usize, nodes: usize, edges: usize) {
        self.clear();
        if is_quiet() {
            return;
        }
        println!();
        println!(
            "{} {} files, {} nodes, {} edges in {}",
            " ok".style(theme().success.clone()),
            files,
            nodes,
            edges,
            HumanDuration(duration)
        );
    }
}
