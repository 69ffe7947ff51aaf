//! ASCII map layouts, the colour source for the demo binary.
//!
//! `#` is an obstacle, `S` a spawn point, anything else open ground. The layout must be
//! square: as many rows as columns.

use std::path::Path;

use anyhow::Context;
use isla_map::{ColorSample, Palette, Rgb};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Layout is empty")]
    Empty,
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow { row: usize, found: usize, expected: usize },
    #[error("Layout has {rows} rows but {width} columns")]
    NotSquare { rows: usize, width: usize },
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: usize,
    pub samples: Vec<ColorSample>,
}

/// Parses a layout into colour samples in row-major order.
pub fn parse_layout(text: &str, palette: &Palette) -> Result<Layout, LayoutError> {
    let obstacle = palette.obstacle.first().copied().unwrap_or(Rgb::BLACK);
    let spawn = palette.spawn.first().copied().unwrap_or(Rgb::RED);

    let rows: Vec<&str> = text.lines().map(str::trim_end).filter(|row| !row.is_empty()).collect();
    let width = rows.first().map(|row| row.chars().count()).ok_or(LayoutError::Empty)?;
    if rows.len() != width {
        return Err(LayoutError::NotSquare { rows: rows.len(), width });
    }

    let mut samples = Vec::with_capacity(width * width);
    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(LayoutError::RaggedRow { row: y, found, expected: width });
        }
        for (x, glyph) in row.chars().enumerate() {
            let color = match glyph {
                '#' => obstacle,
                'S' => spawn,
                _ => Rgb::WHITE,
            };
            samples.push(ColorSample::new(x as i32, y as i32, color));
        }
    }

    Ok(Layout { width, samples })
}

pub fn load_layout(path: impl AsRef<Path>, palette: &Palette) -> anyhow::Result<Layout> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read layout {}", path.display()))?;
    parse_layout(&text, palette).with_context(|| format!("Invalid layout {}", path.display()))
}
