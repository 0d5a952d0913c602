//! Plain-text renderer for terminals.

use std::io::Write;

use super::{Renderer, SectionGroup, ViewItem, ViewModel};
use crate::error::Result;

/// Placeholder shown for an empty collection.
pub const EMPTY_PLACEHOLDER: &str = "Нет данных. Добавьте первый показатель!";

/// Renders view models as numbered cards to any writer.
#[derive(Debug)]
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    /// Create a renderer writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the renderer and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_item(&mut self, item: &ViewItem) -> Result<()> {
        writeln!(
            self.out,
            "{:>4}. {:<32} {:>12}   {}",
            item.position, item.name, item.value, item.period_label
        )?;
        Ok(())
    }

    fn write_group(&mut self, group: &SectionGroup) -> Result<()> {
        let marker = if group.collapsed { '▸' } else { '▾' };
        writeln!(self.out, "{marker} {} ({})", group.title, group.count)?;
        for item in group.visible_items() {
            self.write_item(item)?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, view: &ViewModel) -> Result<()> {
        match view {
            ViewModel::Empty => writeln!(self.out, "{EMPTY_PLACEHOLDER}")?,
            ViewModel::Flat { items } => {
                for item in items {
                    self.write_item(item)?;
                }
            }
            ViewModel::Grouped { groups } => {
                for (i, group) in groups.iter().enumerate() {
                    if i > 0 {
                        writeln!(self.out)?;
                    }
                    self.write_group(group)?;
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;
    use crate::record::MetricRecord;
    use crate::view::{CollapseState, ViewOptions};

    fn render(view: &ViewModel) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render(view).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn record(name: &str, value: &str, period: &str) -> MetricRecord {
        MetricRecord::new(name, value, Period::parse(period).unwrap()).unwrap()
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&ViewModel::Empty), format!("{EMPTY_PLACEHOLDER}\n"));
    }

    #[test]
    fn test_render_flat_numbers_items() {
        let records = vec![record("KPI", "5%", "2026-01"), record("Выручка", "100", "2026-02")];
        let options = ViewOptions {
            grouped: false,
            ..ViewOptions::default()
        };
        let output = render(&ViewModel::derive(&records, &options, &CollapseState::new()));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_start().starts_with("1. Выручка"));
        assert!(lines[0].ends_with("Февраль 2026"));
        assert!(lines[1].contains("KPI"));
    }

    #[test]
    fn test_render_collapsed_group_shows_header_only() {
        let records = vec![
            record("a", "1", "2026-01").with_section("HR"),
            record("b", "2", "2026-01").with_section("HR"),
        ];
        let mut collapse = CollapseState::new();
        collapse.collapse("HR");
        let output = render(&ViewModel::derive(
            &records,
            &ViewOptions::default(),
            &collapse,
        ));
        assert_eq!(output, "▸ HR (2)\n");
    }

    #[test]
    fn test_render_expanded_groups() {
        let records = vec![
            record("a", "1", "2026-01").with_section("HR"),
            record("b", "2", "2026-01"),
        ];
        let output = render(&ViewModel::derive(
            &records,
            &ViewOptions::default(),
            &CollapseState::new(),
        ));
        assert!(output.starts_with("▾ HR (1)\n"));
        assert!(output.contains("▾ Прочее (1)"));
    }
}
