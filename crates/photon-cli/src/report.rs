// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table and JSON rendering for command output.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use photon_file::{LayerAnalysis, PhotonFile, HEADER_MAGIC};
use serde_json::{json, Value};

fn table(header: &[&str]) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    t
}

/// Inputs for the info view that need decoding work up front.
pub struct InfoFacts {
    pub exposed_pixels: u64,
    pub peel_s: f32,
}

pub fn info_table(file: &PhotonFile, facts: &InfoFacts) -> Table {
    let header = file.header();
    let f = header.fields();
    let mut t = table(&["Field", "Value"]);
    let magic = if f.magic == HEADER_MAGIC {
        format!("{:#010x}", f.magic)
    } else {
        format!("{:#010x} (unexpected)", f.magic)
    };
    let rows: Vec<(&str, String)> = vec![
        ("Magic", magic),
        ("Version", header.version().to_string()),
        (
            "Build area",
            format!("{:.2} x {:.2} x {:.2} mm", f.bed_size_mm[0], f.bed_size_mm[1], f.bed_size_mm[2]),
        ),
        (
            "Resolution",
            format!("{} x {} px", f.resolution[0], f.resolution[1]),
        ),
        ("Mirrored", header.is_mirrored().to_string()),
        ("Layer height", format!("{:.3} mm", f.layer_height_mm)),
        ("Layers", f.layer_count.to_string()),
        ("Exposure", format!("{} s", f.exposure_s)),
        ("Bottom exposure", format!("{} s", f.bottom_exposure_s)),
        ("Off time", format!("{} s", f.off_time_s)),
        ("Bottom layers", f.bottom_layers.to_string()),
        ("Anti-aliasing", header.aa_levels().to_string()),
        (
            "Previews",
            format!(
                "{} x {}, {} x {}",
                file.preview_one().width(),
                file.preview_one().height(),
                file.preview_two().width(),
                file.preview_two().height()
            ),
        ),
        ("Exposed pixels", facts.exposed_pixels.to_string()),
        (
            "Volume",
            format!("{:.1} ml", file.volume_ml(facts.exposed_pixels)),
        ),
        (
            "Print time (est.)",
            format_duration(u64::from(header.estimated_print_time_s(facts.peel_s))),
        ),
    ];
    for (k, v) in rows {
        t.add_row(vec![k.to_string(), v]);
    }
    if let Some(p) = file.print_parameters() {
        t.add_row(vec![
            "Print time (file)".to_string(),
            format_duration(u64::from(f.print_time_s)),
        ]);
        t.add_row(vec!["Volume (file)".to_string(), format!("{:.1} ml", p.volume_ml)]);
        t.add_row(vec!["Weight".to_string(), format!("{:.2} g", p.weight_g)]);
        t.add_row(vec!["Cost".to_string(), format!("{:.4} $", p.cost)]);
    }
    if let Some(m) = file.machine_info() {
        t.add_row(vec!["Machine info".to_string(), format!("{} bytes", m.len())]);
    }
    t
}

pub fn info_json(file: &PhotonFile, facts: &InfoFacts) -> Value {
    let header = file.header();
    let f = header.fields();
    let params = file.print_parameters().map(|p| {
        json!({
            "bottom_lift_distance_mm": p.bottom_lift_distance_mm,
            "bottom_lift_speed": p.bottom_lift_speed,
            "lift_distance_mm": p.lift_distance_mm,
            "lift_speed": p.lift_speed,
            "retract_speed": p.retract_speed,
            "volume_ml": p.volume_ml,
            "weight_g": p.weight_g,
            "cost": p.cost,
            "bottom_light_off_delay_s": p.bottom_light_off_delay_s,
            "light_off_delay_s": p.light_off_delay_s,
            "bottom_layers": p.bottom_layers,
        })
    });
    json!({
        "magic": f.magic,
        "version": header.version(),
        "bed_size_mm": f.bed_size_mm,
        "resolution": f.resolution,
        "mirrored": header.is_mirrored(),
        "layer_height_mm": f.layer_height_mm,
        "layer_count": f.layer_count,
        "exposure_s": f.exposure_s,
        "bottom_exposure_s": f.bottom_exposure_s,
        "off_time_s": f.off_time_s,
        "bottom_layers": f.bottom_layers,
        "anti_aliasing_level": header.aa_levels(),
        "print_time_s": f.print_time_s,
        "estimated_print_time_s": header.estimated_print_time_s(facts.peel_s),
        "exposed_pixels": facts.exposed_pixels,
        "volume_ml": file.volume_ml(facts.exposed_pixels),
        "summary": header.summary(),
        "print_parameters": params,
        "machine_info_size": header.machine_info_size(),
    })
}

pub fn layers_table(file: &PhotonFile) -> Table {
    let mut t = table(&["#", "Z (mm)", "Exposure (s)", "Off (s)", "Bytes", "Sub-layers"]);
    for (i, layer) in file.layers().iter().enumerate() {
        t.add_row(vec![
            i.to_string(),
            format!("{:.3}", layer.position_z_mm),
            format!("{}", layer.exposure_s),
            format!("{}", layer.off_time_s),
            layer.image().len().to_string(),
            layer.anti_alias().len().to_string(),
        ]);
    }
    t
}

pub fn islands_table(results: &[LayerAnalysis], all: bool) -> Table {
    let mut t = table(&["#", "Reconnected", "Islands left", "Rows"]);
    for r in results.iter().filter(|r| all || r.remaining_islands > 0) {
        t.add_row(vec![
            r.index.to_string(),
            r.reconnected.to_string(),
            r.remaining_islands.to_string(),
            row_list(&r.island_rows),
        ]);
    }
    t
}

/// First few row numbers, then how many more.
fn row_list(rows: &[u32]) -> String {
    const SHOWN: usize = 4;
    let shown = rows
        .iter()
        .take(SHOWN)
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if rows.len() > SHOWN {
        format!("{shown} (+{})", rows.len() - SHOWN)
    } else {
        shown
    }
}

/// `42 s`, `3 m, 5 s`, `2 h, 0 m, 9 s`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds} s");
    }
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    if minutes < 60 {
        return format!("{minutes} m, {seconds} s");
    }
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{hours} h, {minutes} m, {seconds} s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pick_the_largest_unit() {
        assert_eq!(format_duration(42), "42 s");
        assert_eq!(format_duration(185), "3 m, 5 s");
        assert_eq!(format_duration(7209), "2 h, 0 m, 9 s");
    }

    #[test]
    fn islands_table_hides_clean_layers() {
        let results = vec![
            LayerAnalysis {
                index: 0,
                remaining_islands: 0,
                reconnected: 3,
                island_rows: Vec::new(),
                packed: Vec::new(),
            },
            LayerAnalysis {
                index: 1,
                remaining_islands: 2,
                reconnected: 0,
                island_rows: vec![4, 9],
                packed: Vec::new(),
            },
        ];
        assert_eq!(islands_table(&results, false).row_iter().count(), 1);
        assert_eq!(islands_table(&results, true).row_iter().count(), 2);
    }

    #[test]
    fn long_row_lists_are_shortened() {
        assert_eq!(row_list(&[]), "");
        assert_eq!(row_list(&[4, 9]), "4, 9");
        assert_eq!(row_list(&[1, 2, 3, 4, 5, 6]), "1, 2, 3, 4 (+2)");
    }
}
