use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::clock::ClockReading;
use crate::config::Config;
use crate::plant::{CareEvent, CareKind, Plant};
use crate::schedule::EvaluationResult;

#[derive(Debug, Clone)]
pub struct ListRow {
    pub name: String,
    pub location: Option<String>,
    pub last_event: Option<String>,
    pub result: EvaluationResult,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true) && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn print_list(&self, kind: CareKind, rows: &[ListRow]) -> anyhow::Result<()> {
        self.write_list(io::stdout().lock(), kind, rows)
    }

    pub fn write_list<W: Write>(
        &self,
        mut out: W,
        kind: CareKind,
        rows: &[ListRow],
    ) -> anyhow::Result<()> {
        if rows.is_empty() {
            writeln!(out, "No plants yet. Add one with `sprout add <name> {kind}:<days>`.")?;
            return Ok(());
        }

        let headers = vec![
            String::new(),
            "Plant".to_string(),
            "Where".to_string(),
            "Last".to_string(),
            "Status".to_string(),
            "Next".to_string(),
        ];

        let body = rows
            .iter()
            .map(|row| {
                let style = row.result.status.style();
                vec![
                    style.icon.to_string(),
                    row.name.clone(),
                    row.location.clone().unwrap_or_default(),
                    row.last_event.clone().unwrap_or_else(|| "-".to_string()),
                    self.paint(style.label, style.ansi_color),
                    row.result.display_text.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, body)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(plant = %plant.name))]
    pub fn print_plant_info(
        &self,
        plant: &Plant,
        evaluations: &[(CareKind, EvaluationResult)],
        recent: &[&CareEvent],
    ) -> anyhow::Result<()> {
        self.write_plant_info(io::stdout().lock(), plant, evaluations, recent)
    }

    pub fn write_plant_info<W: Write>(
        &self,
        mut out: W,
        plant: &Plant,
        evaluations: &[(CareKind, EvaluationResult)],
        recent: &[&CareEvent],
    ) -> anyhow::Result<()> {
        writeln!(out, "name      {}", plant.name)?;
        writeln!(out, "id        {}", plant.id)?;
        writeln!(out, "location  {}", plant.location.clone().unwrap_or_default())?;
        writeln!(out, "added     {}", plant.created.format("%Y%m%dT%H%M%SZ"))?;

        for (kind, result) in evaluations {
            let style = result.status.style();
            writeln!(
                out,
                "{:<9} {} {} · {}",
                kind.to_string(),
                style.icon,
                self.paint(style.label, style.ansi_color),
                result.display_text
            )?;
        }

        if !recent.is_empty() {
            writeln!(out)?;
            writeln!(out, "recent")?;
            for event in recent {
                let time = event.time.map(|t| format!(" {t}")).unwrap_or_default();
                let note = event
                    .note
                    .as_deref()
                    .map(|n| format!("  {n}"))
                    .unwrap_or_default();
                writeln!(out, "  {}{}  {}{}", event.date, time, event.kind, note)?;
            }
        }

        Ok(())
    }

    pub fn print_today(&self, reading: &ClockReading, tz: &str) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} {} {tz}", reading.today, reading.time_of_day)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    write_row(&mut writer, &widths, &headers)?;
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    write_row(&mut writer, &widths, &rule)?;
    for row in &rows {
        write_row(&mut writer, &widths, row)?;
    }

    Ok(())
}

fn write_row<W: Write>(writer: &mut W, widths: &[usize], cells: &[String]) -> anyhow::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(visible_width(cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

fn visible_width(cell: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(cell).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
