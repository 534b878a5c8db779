/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` into straight RGBA8.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 4]> {
    let digits = hex.strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }

    match digits.len() {
        3 => {
            let mut out = [0, 0, 0, 255];
            for (i, c) in digits.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 | 8 => {
            let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
            let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
            let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
            let a = if digits.len() == 8 {
                u8::from_str_radix(&digits[6..8], 16).ok()?
            } else {
                255
            };
            Some([r, g, b, a])
        }
        _ => None,
    }
}
