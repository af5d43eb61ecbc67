//! Neutron and X-ray scattering section.

use crate::config::SessionConfig;
use crate::format::{js_number_string, parse_float, to_fixed, to_precision};
use crate::query::FormSnapshot;
use crate::render::html::{escape_html, formula_markup};
use crate::response::{ContrastMatch, NeutronScattering, Sample, XrayScattering};

/// 1/e penetration depth in cm from absorption and incoherent scattering.
/// Coherent scattering is left out of the estimate.
pub fn penetration_depth(scat: &NeutronScattering) -> f64 {
    1.0 / (scat.xs.abs + scat.xs.incoh)
}

pub fn transmission_percent(thickness: f64, penetration: f64) -> f64 {
    100.0 * (-thickness / penetration).exp()
}

/// Transmission text: two decimals for thick-enough beams or when the
/// transmitted flux is below the activity cutoff, otherwise three
/// significant figures so small transmissions stay visible.
pub fn transmission_text(transmission: f64, transmitted_flux: f64, cutoff_bq: f64) -> String {
    if transmission >= 2.0 || transmitted_flux < cutoff_bq {
        to_fixed(transmission, 2)
    } else {
        to_precision(transmission, 3)
    }
}

pub fn contrast_match_text(contrast: &ContrastMatch) -> Option<String> {
    let fraction = contrast.d2o_fraction?;
    let text = if fraction < 0.0 {
        "&lt; 0% D<sub>2</sub>O".to_string()
    } else if fraction > 1.0 {
        "&gt; 100% D<sub>2</sub>O".to_string()
    } else {
        format!(
            "{}% D<sub>2</sub>O by volume (real SLD = {}&times;10<sup>-6</sup>/&Aring;<sup>2</sup>)",
            to_fixed(fraction * 100.0, 1),
            contrast.sld.map(|sld| to_fixed(sld, 3)).unwrap_or_default()
        )
    };
    Some(text)
}

fn cell_pair(label: &str, value: Option<f64>) -> String {
    format!(
        "<th>{label}</th><td>{}</td>",
        value.map(|v| to_fixed(v, 3)).unwrap_or_default()
    )
}

fn scattering_table(scat: &NeutronScattering, xray: Option<&XrayScattering>) -> String {
    let xray_real = xray.map(|x| x.sld.real);
    let xray_imag = xray.map(|x| -x.sld.imag);

    let mut table = String::from("<table border=1>\n <tr>");
    table.push_str("<th colspan=\"2\">1/e penetration depth<br />(cm)</th>");
    table.push_str("<th colspan=\"2\">Scattering length density<br />(10<sup>-6</sup>/&Aring;<sup>2</sup>)</th>");
    table.push_str("<th colspan=\"2\">Scattering cross section<br />(1/cm)</th>");
    table.push_str("<th colspan=\"2\">X-ray SLD<br />(10<sup>-6</sup>/&Aring;<sup>2</sup>)</th>");
    table.push_str("</tr>\n <tr>");
    table.push_str(&cell_pair("abs", Some(1.0 / scat.xs.abs)));
    table.push_str(&cell_pair("real", Some(scat.sld.real)));
    table.push_str(&cell_pair("coh", Some(scat.xs.coh)));
    table.push_str(&cell_pair("real", xray_real));
    table.push_str("</tr>\n <tr>");
    table.push_str(&cell_pair("abs+incoh", Some(penetration_depth(scat))));
    table.push_str(&cell_pair("imag", Some(-scat.sld.imag)));
    table.push_str(&cell_pair("abs", Some(scat.xs.abs)));
    table.push_str(&cell_pair("imag", xray_imag));
    table.push_str("</tr>\n <tr>");
    table.push_str(&cell_pair("abs+incoh+coh", Some(scat.penetration)));
    table.push_str(&cell_pair("incoh", Some(scat.sld.incoh)));
    table.push_str(&cell_pair("incoh", Some(scat.xs.incoh)));
    table.push_str(&cell_pair("", None));
    table.push_str("</tr>\n</table>");
    table
}

pub fn render_scattering(
    scat: &NeutronScattering,
    xray: Option<&XrayScattering>,
    sample: &Sample,
    form: &FormSnapshot,
    session: &SessionConfig,
) -> String {
    let flux_str = form.get("flux").map(String::as_str).unwrap_or("");
    let density_str = form.get("density").map(String::as_str).unwrap_or("");

    let penetration = penetration_depth(scat);
    let transmission = transmission_percent(sample.thickness, penetration);
    let transmitted_flux = parse_float(flux_str) * transmission / 100.0;

    let mut content = format!("<h3>Scattering from {}</h3>", escape_html(&sample.name));

    content.push_str(&format!(
        "<p>Source neutrons: {}&thinsp;&Aring; = {}&thinsp;meV = {}&thinsp;m/s<br>",
        to_fixed(scat.neutron.wavelength, 3),
        to_fixed(scat.neutron.energy, 2),
        to_fixed(scat.neutron.velocity, 0)
    ));
    if let Some(xray) = xray {
        content.push_str(&format!(
            "Source X-rays: {}&thinsp;&Aring; = {}&thinsp;keV<br>",
            to_fixed(xray.xray.wavelength, 3),
            to_fixed(xray.xray.energy, 3)
        ));
    }
    content.push_str(&format!(
        "Sample in beam: {} at {}&thinsp;g/cm<sup>3</sup>",
        formula_markup(&sample.formula_latex),
        to_fixed(sample.density, 2)
    ));
    if density_str.contains(':') {
        content.push_str(&format!(" from lattice {}", escape_html(density_str)));
    }
    content.push_str("</p>");

    content.push_str(&scattering_table(scat, xray));

    content.push_str(&format!(
        "<p>Neutron transmission is {}% for {}&thinsp;cm of sample (after absorption and incoherent scattering).\n",
        transmission_text(transmission, transmitted_flux, session.cutoff_bq()),
        js_number_string(sample.thickness)
    ));
    content.push_str(&format!(
        "<br>Transmitted flux is {}&thinsp;n/cm<sup>2</sup>/s for a {}&thinsp;n/cm<sup>2</sup>/s beam.\n",
        to_precision(transmitted_flux, 4),
        escape_html(flux_str)
    ));

    match contrast_match_text(&scat.contrast_match) {
        Some(text) => content.push_str(&format!("<br>Contrast match point: {text}</p>\n")),
        None => content.push_str("</p>"),
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{CrossSections, NeutronSld, NeutronSource, XraySld, XraySource};

    fn neutron(fraction: Option<f64>) -> NeutronScattering {
        NeutronScattering {
            neutron: NeutronSource {
                wavelength: 1.798,
                energy: 25.3,
                velocity: 2200.0,
            },
            xs: CrossSections {
                coh: 0.5,
                abs: 0.1,
                incoh: 0.4,
            },
            sld: NeutronSld {
                real: 2.0,
                imag: -0.01,
                incoh: 0.2,
            },
            penetration: 1.0,
            transmission: None,
            contrast_match: ContrastMatch {
                d2o_fraction: fraction,
                sld: Some(1.5),
            },
        }
    }

    fn sample() -> Sample {
        Sample {
            name: "water".to_string(),
            formula: "H2O".to_string(),
            formula_latex: "H$_{2}$O".to_string(),
            mass: 1.0,
            density: 1.0,
            thickness: 1.0,
            natural_density: None,
        }
    }

    fn form(flux: &str, density: &str) -> FormSnapshot {
        [("flux", flux), ("density", density)]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn penetration_ignores_coherent_scattering() {
        let scat = neutron(None);
        assert!((penetration_depth(&scat) - 2.0).abs() < 1e-12);
        let t = transmission_percent(1.0, penetration_depth(&scat));
        assert!((t - 100.0 * (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn small_transmission_uses_significant_figures() {
        assert_eq!(transmission_text(1.5, 1000.0, 18.5), "1.50");
        assert_eq!(transmission_text(0.012345, 1000.0, 18.5), "0.0123");
        assert_eq!(transmission_text(0.012345, 10.0, 18.5), "0.01");
        assert_eq!(transmission_text(60.6531, 1000.0, 18.5), "60.65");
    }

    #[test]
    fn contrast_match_bounds() {
        let over = contrast_match_text(&neutron(Some(1.5)).contrast_match).unwrap();
        assert_eq!(over, "&gt; 100% D<sub>2</sub>O");
        let under = contrast_match_text(&neutron(Some(-0.2)).contrast_match).unwrap();
        assert_eq!(under, "&lt; 0% D<sub>2</sub>O");
        let inside = contrast_match_text(&neutron(Some(0.425)).contrast_match).unwrap();
        assert!(inside.starts_with("42.5% D<sub>2</sub>O by volume (real SLD = 1.500"));
        assert!(contrast_match_text(&neutron(None).contrast_match).is_none());
    }

    #[test]
    fn over_range_match_point_has_no_fraction() {
        let html = render_scattering(
            &neutron(Some(1.5)),
            None,
            &sample(),
            &form("100000", "1"),
            &SessionConfig::default(),
        );
        assert!(html.contains("&gt; 100% D<sub>2</sub>O"));
        assert!(!html.contains("by volume"));
    }

    #[test]
    fn lattice_density_is_echoed_escaped() {
        let xray = XrayScattering {
            xray: XraySource {
                wavelength: 1.5418,
                energy: 8.04,
            },
            sld: XraySld {
                real: 9.4,
                imag: -0.03,
            },
        };
        let html = render_scattering(
            &neutron(None),
            Some(&xray),
            &sample(),
            &form("1e5", "a=3.5:<b>"),
            &SessionConfig::default(),
        );
        assert!(html.contains("Source X-rays: 1.542&thinsp;&Aring; = 8.040&thinsp;keV"));
        assert!(html.contains("Sample in beam: H<sub>2</sub>O at 1.00&thinsp;g/cm<sup>3</sup> from lattice a=3.5:&lt;b&gt;"));
        assert!(html.contains("<th>real</th><td>9.400</td>"));
        assert!(html.contains("Neutron transmission is 60.65% for 1&thinsp;cm"));
        assert!(html.contains("Transmitted flux is 6.065e+4&thinsp;n/cm<sup>2</sup>/s for a 1e5&thinsp;n/cm<sup>2</sup>/s beam."));
        assert!(html.ends_with("</p>"));
    }
}
