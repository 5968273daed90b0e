//! Background execution of conversion jobs.
//!
//! A [`JobRunner`] runs one job at a time on tokio's blocking pool and hands
//! the result back through a oneshot channel wrapped in a [`JobHandle`].
//! Submitting while a job is still running is rejected with
//! [`ConvertError::JobInFlight`], so two jobs never share progress state.
//!
//! ```rust,no_run
//! use pdfjpg::{EngineConfig, Job, JobOutcome, JobRunner, JpgToPdfConfig};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = JobRunner::new(EngineConfig::discover());
//! let handle = runner.submit(Job::JpgToPdf {
//!     images: vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")],
//!     config: JpgToPdfConfig::default(),
//! })?;
//! let outcome = JobOutcome::from_result(&handle.wait().await);
//! println!("{}: {}", outcome.success, outcome.message);
//! # Ok(())
//! # }
//! ```

use crate::config::{EngineConfig, JpgToPdfConfig, PdfToJpgConfig};
use crate::convert;
use crate::error::ConvertError;
use crate::output::{JpgToPdfOutput, PdfToJpgOutput};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// One unit of work.
#[derive(Debug, Clone)]
pub enum Job {
    /// Rasterise each PDF in order; stops at the first failing document.
    PdfToJpg {
        inputs: Vec<PathBuf>,
        config: PdfToJpgConfig,
    },
    /// Merge images, in order, into one PDF.
    JpgToPdf {
        images: Vec<PathBuf>,
        config: JpgToPdfConfig,
    },
}

impl Job {
    /// Run the job on the current thread.
    pub fn run(self, engine: &EngineConfig) -> Result<JobOutput, ConvertError> {
        match self {
            Job::PdfToJpg { inputs, config } => {
                convert::pdfs_to_jpg(&inputs, engine, &config).map(JobOutput::Images)
            }
            Job::JpgToPdf { images, config } => {
                convert::jpg_to_pdf(&images, &config).map(JobOutput::Pdf)
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Job::PdfToJpg { .. } => "pdf-to-jpg",
            Job::JpgToPdf { .. } => "jpg-to-pdf",
        }
    }
}

/// What a successful job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutput {
    Images(Vec<PdfToJpgOutput>),
    Pdf(JpgToPdfOutput),
}

impl JobOutput {
    /// Where the user should look: the last output folder, or the PDF.
    pub fn location(&self) -> Option<&Path> {
        match self {
            JobOutput::Images(outputs) => outputs.last().map(|o| o.output_dir.as_path()),
            JobOutput::Pdf(output) => Some(output.output_file.as_path()),
        }
    }
}

/// A result reduced to a success flag and a message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
    pub location: Option<PathBuf>,
}

impl JobOutcome {
    pub fn from_result(result: &Result<JobOutput, ConvertError>) -> Self {
        match result {
            Ok(output) => {
                let message = match output {
                    JobOutput::Images(outputs) => {
                        let pages: usize = outputs.iter().map(|o| o.files.len()).sum();
                        format!(
                            "Converted {} PDF(s), {} page image(s) saved next to the originals",
                            outputs.len(),
                            pages
                        )
                    }
                    JobOutput::Pdf(output) => {
                        format!("PDF created: {}", output.output_file.display())
                    }
                };
                Self {
                    success: true,
                    message,
                    location: output.location().map(Path::to_path_buf),
                }
            }
            Err(e) => Self {
                success: false,
                message: e.to_string(),
                location: None,
            },
        }
    }
}

/// Clears the busy flag when the worker ends, including by panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs at most one job at a time in the background.
#[derive(Debug, Clone)]
pub struct JobRunner {
    engine: Arc<EngineConfig>,
    busy: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// `true` while a submitted job has not finished.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start `job` on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// [`ConvertError::JobInFlight`] if another job is still running.
    pub fn submit(&self, job: Job) -> Result<JobHandle, ConvertError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected {} job: another job is running", job.kind());
            return Err(ConvertError::JobInFlight);
        }

        let guard = BusyGuard(Arc::clone(&self.busy));
        let engine = Arc::clone(&self.engine);
        let (tx, rx) = oneshot::channel();
        debug!("Submitting {} job", job.kind());

        tokio::task::spawn_blocking(move || {
            let result = job.run(&engine);
            // Free the runner before reporting so the receiver can resubmit.
            drop(guard);
            let _ = tx.send(result);
        });

        Ok(JobHandle { rx })
    }
}

/// The pending result of a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    rx: oneshot::Receiver<Result<JobOutput, ConvertError>>,
}

impl JobHandle {
    /// Wait for the job to finish.
    pub async fn wait(self) -> Result<JobOutput, ConvertError> {
        self.rx
            .await
            .map_err(|_| ConvertError::Internal("conversion worker stopped without a result".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ConversionProgressCallback;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::mpsc;
    use std::sync::Mutex;

    /// Holds the worker inside the job until the test releases it.
    struct Gate {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ConversionProgressCallback for Gate {
        fn on_conversion_start(&self, _total_pages: usize) {
            let _ = self.release.lock().unwrap().recv();
        }
    }

    fn write_jpeg(path: &Path) {
        let img = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        DynamicImage::ImageRgb8(img).save(path).unwrap();
    }

    #[tokio::test]
    async fn second_submission_is_rejected_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.jpg");
        write_jpeg(&img);

        let (release, gate_rx) = mpsc::channel();
        let gated = JpgToPdfConfig::builder()
            .progress_callback(Arc::new(Gate {
                release: Mutex::new(gate_rx),
            }))
            .build()
            .unwrap();

        let runner = JobRunner::new(EngineConfig::missing("unused"));
        let first = runner
            .submit(Job::JpgToPdf {
                images: vec![img.clone()],
                config: gated,
            })
            .unwrap();
        assert!(runner.is_busy());

        let second = runner.submit(Job::JpgToPdf {
            images: vec![img.clone()],
            config: JpgToPdfConfig::default(),
        });
        assert!(matches!(second, Err(ConvertError::JobInFlight)));

        release.send(()).unwrap();
        let output = first.wait().await.unwrap();
        assert!(matches!(output, JobOutput::Pdf(ref o) if o.page_count == 1));
        assert!(!runner.is_busy());

        let third = runner
            .submit(Job::JpgToPdf {
                images: vec![img],
                config: JpgToPdfConfig::default(),
            })
            .unwrap();
        assert!(third.wait().await.is_ok());
    }

    #[tokio::test]
    async fn failures_reduce_to_message() {
        let runner = JobRunner::new(EngineConfig::missing("engine absent"));
        let handle = runner
            .submit(Job::PdfToJpg {
                inputs: vec![PathBuf::from("/x/doc.pdf")],
                config: PdfToJpgConfig::default(),
            })
            .unwrap();
        let outcome = JobOutcome::from_result(&handle.wait().await);
        assert!(!outcome.success);
        assert!(outcome.message.contains("doc.pdf failed"), "got: {}", outcome.message);
        assert!(outcome.message.contains("engine absent"));
        assert!(outcome.location.is_none());
        assert!(!runner.is_busy());
    }

    #[tokio::test]
    async fn empty_jpg_job_reports_no_images() {
        let runner = JobRunner::new(EngineConfig::missing("unused"));
        let handle = runner
            .submit(Job::JpgToPdf {
                images: vec![],
                config: JpgToPdfConfig::default(),
            })
            .unwrap();
        let outcome = JobOutcome::from_result(&handle.wait().await);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "No images selected");
    }
}
