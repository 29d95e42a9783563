//! Error rendering using ariadne
//!
//! This module renders compile diagnostics with source snippets and help
//! notes. Evaluation errors carry no source location and render as a single
//! line.

use crate::{Diagnostic, Error};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Render an error with formatting to stderr
///
/// # Example
/// ```no_run
/// use caveats::{ParameterDeclarations, compile, render_error};
///
/// match compile("broken", "age >=", ParameterDeclarations::new()) {
///     Err(e) => render_error(&e),
///     Ok(_) => {}
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String (useful for logs and web UIs)
pub fn render_error_to_string(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Compilation { code, error } => {
            writeln!(writer, "{}", error)?;
            render_diagnostics(code, &error.diagnostics(), writer, use_color)
        }
        Error::Evaluation(error) => {
            writeln!(writer, "Evaluation failed: {}", error)
        }
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let mut report = Report::build(ReportKind::Error, ("<caveat>", diag.span.0.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        let color = colors.next();
        report = report.with_label(
            Label::new(("<caveat>", diag.span.0.clone()))
                .with_message(&diag.message)
                .with_color(color),
        );

        if let Some(help) = &diag.help {
            report = report.with_help(help);
        }

        // Reborrow so the writer is not moved.
        report
            .finish()
            .write(("<caveat>", Source::from(source)), &mut *writer)?;
    }

    Ok(())
}
