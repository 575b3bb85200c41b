// Command results and their text / JSON rendering

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::receiver::DynamicModel;
use crate::ubx::messages::{MonVer, Nav5, ProtocolVersion};

/// Result of one command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Model(ModelReport),
    Set(SetReport),
    Saved(SaveReport),
    Info(InfoReport),
    List(ModelList),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model: DynamicModel,
    pub code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Nav5>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetReport {
    pub model: DynamicModel,
    pub code: u8,
    /// Code the receiver reported before the change
    pub previous_code: u8,
    pub changed: bool,
    pub verified: bool,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReport {
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoReport {
    pub software: String,
    pub hardware: String,
    pub protocol_version: Option<ProtocolVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub extensions: Vec<String>,
}

impl From<MonVer> for InfoReport {
    fn from(version: MonVer) -> Self {
        Self {
            protocol_version: version.protocol_version(),
            firmware: version.extension("FWVER").map(str::to_string),
            module: version.extension("MOD").map(str::to_string),
            software: version.software,
            hardware: version.hardware,
            extensions: version.extensions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelList {
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEntry {
    pub name: &'static str,
    pub code: u8,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_protocol_version: Option<ProtocolVersion>,
}

impl From<DynamicModel> for ModelEntry {
    fn from(model: DynamicModel) -> Self {
        Self {
            name: model.name(),
            code: model.code(),
            aliases: model.aliases(),
            description: model.description(),
            min_protocol_version: model.min_protocol_version(),
        }
    }
}

impl Report {
    pub fn model_list() -> Self {
        Report::List(ModelList {
            models: DynamicModel::ALL.into_iter().map(ModelEntry::from).collect(),
        })
    }

    /// Render for stdout
    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            let mut out = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
            out.push('\n');
            Ok(out)
        } else {
            Ok(self.to_text())
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Report::Model(report) => format_model(report),
            Report::Set(report) => format_set(report),
            Report::Saved(_) => "Configuration saved\n".to_string(),
            Report::Info(report) => format_info(report),
            Report::List(list) => format_list(&list.models),
        }
    }
}

fn describe_code(code: u8) -> String {
    match DynamicModel::try_from(code) {
        Ok(model) => format!("{} ({})", model, code),
        Err(_) => format!("unknown ({})", code),
    }
}

fn format_model(report: &ModelReport) -> String {
    let mut output = format!("{}\n", describe_code(report.code));

    if let Some(nav) = &report.navigation {
        let fix_mode = match nav.fix_mode {
            1 => "2D only",
            2 => "3D only",
            3 => "auto 2D/3D",
            _ => "unknown",
        };
        let _ = write!(
            output,
            "  Parameter mask:       {:#06x} ({})\n\
             \x20 Fix mode:             {} ({})\n\
             \x20 Fixed altitude:       {:.2} m (variance {:.4} m^2)\n\
             \x20 Min elevation:        {} deg\n\
             \x20 DR limit:             {} s\n\
             \x20 Position DOP mask:    {:.1}\n\
             \x20 Time DOP mask:        {:.1}\n\
             \x20 Position accuracy:    {} m\n\
             \x20 Time accuracy:        {} m\n\
             \x20 Static hold:          {} cm/s, max {} m\n\
             \x20 DGNSS timeout:        {} s\n\
             \x20 C/N0 threshold:       {} dBHz on {} SVs\n\
             \x20 UTC standard:         {}\n",
            nav.mask.0,
            nav.mask.names().join(", "),
            fix_mode,
            nav.fix_mode,
            f64::from(nav.fixed_alt) / 100.0,
            f64::from(nav.fixed_alt_var) / 10_000.0,
            nav.min_elev,
            nav.dr_limit,
            f64::from(nav.p_dop) / 10.0,
            f64::from(nav.t_dop) / 10.0,
            nav.p_acc,
            nav.t_acc,
            nav.static_hold_thresh,
            nav.static_hold_max_dist,
            nav.dgnss_timeout,
            nav.cno_thresh,
            nav.cno_thresh_num_svs,
            nav.utc_standard,
        );
    }

    output
}

fn format_set(report: &SetReport) -> String {
    let mut output = if report.changed {
        format!(
            "Dynamic model set to {} (was {})\n",
            describe_code(report.code),
            describe_code(report.previous_code)
        )
    } else {
        format!("Dynamic model already {}\n", describe_code(report.code))
    };

    if report.saved {
        output.push_str("Configuration saved\n");
    }

    output
}

fn format_info(report: &InfoReport) -> String {
    let protocol = report
        .protocol_version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut output = format!(
        "Software: {}\nHardware: {}\nProtocol: {}\n",
        report.software, report.hardware, protocol
    );

    if let Some(firmware) = &report.firmware {
        let _ = writeln!(output, "Firmware: {}", firmware);
    }
    if let Some(module) = &report.module {
        let _ = writeln!(output, "Module:   {}", module);
    }

    if !report.extensions.is_empty() {
        output.push_str("Extensions:\n");
        for ext in &report.extensions {
            let _ = writeln!(output, "  {}", ext);
        }
    }

    output
}

fn format_list(entries: &[ModelEntry]) -> String {
    let mut output = String::from("CODE  NAME        DESCRIPTION\n");

    for entry in entries {
        let _ = write!(output, "{:>4}  {:<10}  {}", entry.code, entry.name, entry.description);
        if let Some(min) = entry.min_protocol_version {
            let _ = write!(output, " [PROTVER >= {}]", min);
        }
        if !entry.aliases.is_empty() {
            let _ = write!(output, " (aka {})", entry.aliases.join(", "));
        }
        output.push('\n');
    }

    output
}
