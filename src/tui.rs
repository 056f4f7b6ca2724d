//! Human-facing output. Everything here goes to stderr; stdout belongs to
//! the result stream.

use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::pipeline::RunSummary;

// Palette (melt → crystal)
pub const COLD: Color = Color::DarkGrey;
pub const WARM: Color = Color::Red;
pub const HOT: Color = Color::AnsiValue(208); // orange
pub const PURE: Color = Color::White;

pub fn hr() {
    eprintln!(
        "{}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{}",
        fg(COLD),
        reset()
    );
}

pub fn header(title: &str) {
    eprintln!();
    hr();
    eprintln!(
        "{}{}  {}{}{}",
        SetAttribute(Attribute::Bold),
        fg(PURE),
        title,
        reset(),
        SetAttribute(Attribute::Reset),
    );
    hr();
}

pub fn status_line(icon: &str, color: Color, msg: &str) {
    eprintln!("  {}{}{} {}", fg(color), icon, reset(), msg);
}

pub fn show_banner() {
    eprintln!();
    eprint!("  {}░░░", fg(COLD));
    eprint!("{}▒", fg(WARM));
    eprint!("{}▓", fg(HOT));
    eprint!(
        "  {}{}TAPATITE{}",
        SetAttribute(Attribute::Bold),
        fg(PURE),
        SetAttribute(Attribute::Reset),
    );
    eprint!("  {}▓", fg(HOT));
    eprint!("{}▒", fg(WARM));
    eprintln!("{}░░░{}", fg(COLD), reset());
    eprintln!("  {}melt · cool · saturate{}", fg(COLD), reset());
}

/// Progress bar over a batch, drawn on stderr
pub fn batch_progress(len: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_bar()
        .template("   {bar:30.208/240} {pos}/{len} compositions  {elapsed_precise}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb
}

pub fn summary(summary: &RunSummary, elapsed_secs: u64) {
    header("SUMMARY");
    eprint!(
        "  {}{}{} compositions  {}{}{} saturated",
        fg(PURE),
        summary.compositions,
        reset(),
        fg(PURE),
        summary.emitted,
        reset(),
    );
    if summary.dropped > 0 {
        eprint!("  {}{}{} dropped", fg(WARM), summary.dropped, reset());
    }
    eprintln!("  {}⏱ {}{}", fg(COLD), format_elapsed(elapsed_secs), reset());

    for worker in &summary.workers {
        eprintln!(
            "  {}worker {}: {} emitted, {} dropped{}",
            fg(COLD),
            worker.id,
            worker.emitted,
            worker.dropped,
            reset()
        );
    }
    eprintln!();
}

/// Format elapsed time as "Xm YYs" or "Xs"
pub fn format_elapsed(secs: u64) -> String {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    if mins > 0 {
        format!("{mins}m{remaining_secs:02}s")
    } else {
        format!("{secs}s")
    }
}

fn fg(color: Color) -> SetForegroundColor {
    SetForegroundColor(color)
}

fn reset() -> ResetColor {
    ResetColor
}
