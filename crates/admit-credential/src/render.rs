//! QR rendering of credential tokens.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode, render::svg};
use serde::Serialize;

use crate::{Error, Result};

const MIN_DIMENSION: u32 = 256;

/// Scannable representations of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendering {
  /// Standalone SVG document.
  pub svg:          String,
  /// `data:image/png;base64,…`
  pub png_data_url: String,
}

pub fn render(token: &str) -> Result<Rendering> {
  let code = QrCode::with_error_correction_level(token.as_bytes(), EcLevel::M)
    .map_err(|e| Error::Render(e.to_string()))?;

  let svg = code
    .render::<svg::Color<'_>>()
    .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
    .dark_color(svg::Color("#000000"))
    .light_color(svg::Color("#ffffff"))
    .build();

  let image = code
    .render::<Luma<u8>>()
    .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
    .build();

  let mut png = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
    .map_err(|e| Error::Render(e.to_string()))?;

  Ok(Rendering {
    svg,
    png_data_url: format!("data:image/png;base64,{}", B64.encode(&png)),
  })
}
