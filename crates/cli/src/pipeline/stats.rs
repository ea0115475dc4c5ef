//! Pipeline statistics.

use std::time::Duration;

use contracts::ActivityLabel;
use observability::SessionSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Readings taken off the source channel
    pub readings_received: u64,

    /// Classification ticks run by the engine
    pub ticks: u64,

    /// Label in force when the run ended
    pub final_label: ActivityLabel,

    /// Total duration of the run
    pub duration: Duration,

    /// Whether the run ended on a shutdown signal
    pub interrupted: bool,

    /// Per-sink (name, written, failed, dropped)
    pub sinks: Vec<(String, u64, u64, u64)>,

    /// Activity session summary
    pub session: SessionSummary,
}

impl PipelineStats {
    /// Readings per second
    pub fn readings_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.readings_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Run Statistics                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Readings received: {}", self.readings_received);
        println!("   ├─ Readings/s: {:.2}", self.readings_per_sec());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   ├─ Final activity: {}", self.final_label);
        println!(
            "   └─ Ended by: {}",
            if self.interrupted { "signal" } else { "end of script" }
        );

        if !self.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (i, (name, written, failed, dropped)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: written={} failed={} dropped={}",
                    prefix, name, written, failed, dropped
                );
            }
        }

        println!();
        print!("{}", self.session);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readings_per_sec() {
        let stats = PipelineStats {
            readings_received: 400,
            duration: Duration::from_secs(20),
            ..Default::default()
        };
        assert!((stats.readings_per_sec() - 20.0).abs() < 1e-12);
        assert_eq!(PipelineStats::default().readings_per_sec(), 0.0);
    }
}
