use std::fs::File;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use derive_builder::Builder;
use log::{debug, warn};

use super::{fallback_record, report, Evaluate, PerformanceRecord, SimulationFailure};
use crate::paths::{out_err, out_log};
use crate::space::Sizing;
use crate::TEMPLATES;

pub const PARAMS_TEMPLATE: &str = "params.spice";

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct NgspiceParams {
    /// Path to the gate netlist template (`<gate>.cir`).
    pub template: PathBuf,
    /// Path of the parameter file included by the template. Overwritten on
    /// every evaluation; must not be shared between concurrent runs.
    pub param_file: PathBuf,
    /// Directory for simulator stdout/stderr logs.
    pub work_dir: PathBuf,
    #[builder(default = "String::from(\"ngspice\")")]
    pub command: String,
    #[builder(default = "Duration::from_secs(60)")]
    pub timeout: Duration,
    /// Supply voltage, in volts.
    #[builder(default = "1.8")]
    pub vdd: f64,
    /// Channel length, in meters. Fixed for the whole run.
    #[builder(default = "0.15e-6")]
    pub length: f64,
}

impl NgspiceParams {
    #[inline]
    pub fn builder() -> NgspiceParamsBuilder {
        NgspiceParamsBuilder::default()
    }
}

/// Batch-mode ngspice evaluator.
///
/// Each call writes the parameter file, runs `ngspice -b` against the gate
/// template, and parses the four labeled measurements from its report. Any
/// failure to run the simulator degrades to [`fallback_record`] so the
/// optimization loop keeps going; repeated fallbacks are observable via
/// [`Ngspice::fallback_count`].
pub struct Ngspice {
    params: NgspiceParams,
    fallbacks: u64,
}

impl Ngspice {
    pub fn new(params: NgspiceParams) -> Self {
        Self {
            params,
            fallbacks: 0,
        }
    }

    /// Number of evaluations that returned fallback metrics because the
    /// simulator could not be run.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks
    }

    fn write_params(&self, sizing: &Sizing) -> Result<(), SimulationFailure> {
        let mut ctx = tera::Context::new();
        ctx.insert("vdd", &self.params.vdd);
        ctx.insert("length", &format!("{:e}", self.params.length));
        ctx.insert("w_n", &format!("{:e}", sizing.w_n));
        ctx.insert("w_p", &format!("{:e}", sizing.w_p));
        let contents = TEMPLATES.render(PARAMS_TEMPLATE, &ctx)?;
        std::fs::write(&self.params.param_file, contents)?;
        Ok(())
    }

    fn simulate(&self, sizing: &Sizing) -> Result<PerformanceRecord, SimulationFailure> {
        self.write_params(sizing)?;

        let stdout_path = out_log(&self.params.work_dir, "ngspice");
        let out_file = File::create(&stdout_path)?;
        let err_file = File::create(out_err(&self.params.work_dir, "ngspice"))?;

        let mut child = Command::new(&self.params.command)
            .arg("-b")
            .arg(&self.params.template)
            .stdout(out_file)
            .stderr(err_file)
            .spawn()
            .map_err(|source| SimulationFailure::Spawn {
                command: self.params.command.clone(),
                source,
            })?;

        let deadline = Instant::now() + self.params.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SimulationFailure::Timeout(self.params.timeout));
            }
            std::thread::sleep(Duration::from_millis(10));
        };

        if !status.success() {
            // ngspice reports measurement errors through a nonzero exit code
            // while still printing whatever it measured; parse what we got
            // and let the per-field fallbacks cover the rest.
            debug!("ngspice exited with {status}");
        }

        let output = std::fs::read_to_string(&stdout_path)?;
        Ok(report::parse_report(&output))
    }
}

impl Evaluate for Ngspice {
    fn evaluate(&mut self, sizing: &Sizing) -> PerformanceRecord {
        match self.simulate(sizing) {
            Ok(record) => record,
            Err(e) => {
                warn!("simulation failed ({e}); using fallback metrics");
                self.fallbacks += 1;
                fallback_record()
            }
        }
    }
}
