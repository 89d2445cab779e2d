use std::path::Path;

use heatmap_lib::heatmap_params::{HeatmapParams, BLUR_RANGE, MIN_OPACITY_RANGE, MIN_OPACITY_STEP, RADIUS_RANGE};

pub const BRANDING_LOGOS: [&str; 2] = ["peaklogo.png", "fareshare_logo.jpg"];

const TEXT_COLOUR: &str = "#000033";
const ACCENT_COLOUR: &str = "#ff3399";
const FONT: &str = "Montserrat, 'Open Sans', sans-serif";

struct Slider {
    id: &'static str,
    label: &'static str,
    tooltip: &'static str,
    min: String,
    max: String,
    step: String,
    value: String,
}

impl Slider {
    fn html(&self) -> String {
        format!(r#"<div class="control">
  <input type="range" id="{id}" min="{min}" max="{max}" step="{step}" value="{value}">
  <span title="{tooltip}">{label}: <output id="{id}_value">{value}</output></span>
</div>"#,
            id = self.id,
            min = self.min,
            max = self.max,
            step = self.step,
            value = self.value,
            tooltip = self.tooltip,
            label = self.label,
        )
    }
}

fn sliders(defaults: &HeatmapParams) -> [Slider; 3] {
    [
        Slider {
            id: "radius",
            label: "Radius",
            tooltip: "Radius of each point of the heatmap",
            min: RADIUS_RANGE.start().to_string(),
            max: RADIUS_RANGE.end().to_string(),
            step: "1".into(),
            value: defaults.radius.to_string(),
        },
        Slider {
            id: "blur",
            label: "Blur",
            tooltip: "Amount of blur",
            min: BLUR_RANGE.start().to_string(),
            max: BLUR_RANGE.end().to_string(),
            step: "1".into(),
            value: defaults.blur.to_string(),
        },
        Slider {
            id: "min_opacity",
            label: "Min Opacity",
            tooltip: "The minimum opacity the heat will start at",
            min: MIN_OPACITY_RANGE.start().to_string(),
            max: MIN_OPACITY_RANGE.end().to_string(),
            step: MIN_OPACITY_STEP.to_string(),
            value: defaults.min_opacity.to_string(),
        },
    ]
}

/// Logos present in the asset directory. Missing ones are logged and left off the page.
pub fn available_logos(asset_dir: &Path) -> Vec<&'static str> {
    BRANDING_LOGOS.into_iter()
        .filter(|logo| {
            let found = asset_dir.join(logo).is_file();
            if !found {
                tracing::warn!("Logo {} not found in {}", logo, asset_dir.display());
            }
            found
        })
        .collect()
}

/// The dashboard page. The map itself is fetched from `/map` whenever a control changes.
pub fn render_dashboard(logos: &[&str]) -> String {
    let logos = logos.iter()
        .map(|logo| format!(r#"<div class="logo"><img src="/assets/{logo}" alt="{logo}"></div>"#))
        .collect::<Vec<_>>()
        .join("\n");

    let controls = sliders(&HeatmapParams::default()).iter()
        .map(Slider::html)
        .collect::<Vec<_>>()
        .join("\n");

    format!(r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>United, we hike</title>
<style>
body {{ background: white; color: {TEXT_COLOUR}; font-family: {FONT}; }}
.logo {{ display: inline-block; }}
.logo img {{ height: 100px; }}
.tagline {{ text-align: left; padding-left: 10px; }}
.control {{ width: 15%; display: inline-block; padding: 10px; font-size: 12px; text-align: center; }}
.control input {{ width: 100%; accent-color: {ACCENT_COLOUR}; }}
.control span[title] {{ cursor: help; }}
#reset {{ font-family: {FONT}; font-size: 16px; font-weight: bold; color: {TEXT_COLOUR}; background: {ACCENT_COLOUR}; border: none; padding: 6px 14px; }}
#map_div {{ width: 50%; height: 500px; padding: 10px; }}
#map {{ width: 100%; height: 500px; border: none; }}
</style>
</head>
<body>
{logos}
<div class="tagline"><p>United, <span style="font-weight: bold">we hike</span></p></div>
{controls}
<div class="control"><button id="reset">Reset</button></div>
<div id="map_div"><iframe id="map" title="Heatmap"></iframe></div>
<script>
const sliders = ["radius", "blur", "min_opacity"].map(id => document.getElementById(id));

async function renderMap() {{
    const query = new URLSearchParams(sliders.map(slider => [slider.id, slider.value]));
    const response = await fetch("/map?" + query);
    if (response.ok) {{
        document.getElementById("map").srcdoc = await response.text();
    }} else {{
        console.error("Render failed", response.status, await response.text());
    }}
}}

for (const slider of sliders) {{
    slider.addEventListener("input", () => document.getElementById(slider.id + "_value").value = slider.value);
    slider.addEventListener("change", renderMap);
}}

document.getElementById("reset").addEventListener("click", async () => {{
    const defaults = await (await fetch("/reset")).json();
    for (const slider of sliders) {{
        slider.value = defaults[slider.id];
        document.getElementById(slider.id + "_value").value = slider.value;
    }}
    renderMap();
}});

renderMap();
</script>
</body>
</html>
"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliders_match_parameter_ranges() {
        let page = render_dashboard(&[]);

        assert!(page.contains(r#"id="radius" min="1" max="30" step="1" value="10""#));
        assert!(page.contains(r#"id="blur" min="1" max="20" step="1" value="15""#));
        assert!(page.contains(r#"id="min_opacity" min="0.1" max="1" step="0.1" value="0.4""#));
        assert!(page.contains(r#"<button id="reset">Reset</button>"#));
    }

    #[test]
    fn only_present_logos_are_shown() {
        let dir = std::env::temp_dir().join(format!("heatmap_dashboard_logos_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("peaklogo.png"), b"png").unwrap();

        let logos = available_logos(&dir);
        assert_eq!(logos, vec!["peaklogo.png"]);

        let page = render_dashboard(&logos);
        assert!(page.contains(r#"<img src="/assets/peaklogo.png""#));
        assert!(!page.contains("fareshare_logo.jpg"));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
