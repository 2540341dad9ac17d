//! Ordered pattern catalog for pay statement fields.
//!
//! Each field owns a [`PatternList`]. Order is priority: the first pattern
//! that matches anywhere in the text decides the field, so label variants
//! that are more specific must come before generic ones.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::patterns::{expand, AMOUNT};
use super::FieldMatch;
use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;

/// Canonical identifier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    GrossAmount,
    NetAmount,
    FederalTax,
    StateTax,
    SocialSecurity,
    Medicare,
    #[serde(rename = "employee_401k")]
    Employee401k,
    #[serde(rename = "employer_401k_match")]
    Employer401kMatch,
    EmployeeHsa,
    EmployerHsaMatch,
    EmployeeFsa,
    EmployerFsaMatch,
    HealthInsurance,
    DentalInsurance,
    VisionInsurance,
    PayPeriod,
    PayDate,
}

impl FieldKey {
    /// Every key, in record order.
    pub const ALL: [FieldKey; 17] = [
        FieldKey::PayPeriod,
        FieldKey::GrossAmount,
        FieldKey::NetAmount,
        FieldKey::FederalTax,
        FieldKey::StateTax,
        FieldKey::EmployeeFsa,
        FieldKey::Medicare,
        FieldKey::SocialSecurity,
        FieldKey::Employee401k,
        FieldKey::Employer401kMatch,
        FieldKey::EmployeeHsa,
        FieldKey::EmployerHsaMatch,
        FieldKey::EmployerFsaMatch,
        FieldKey::HealthInsurance,
        FieldKey::DentalInsurance,
        FieldKey::VisionInsurance,
        FieldKey::PayDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::GrossAmount => "gross_amount",
            FieldKey::NetAmount => "net_amount",
            FieldKey::FederalTax => "federal_tax",
            FieldKey::StateTax => "state_tax",
            FieldKey::SocialSecurity => "social_security",
            FieldKey::Medicare => "medicare",
            FieldKey::Employee401k => "employee_401k",
            FieldKey::Employer401kMatch => "employer_401k_match",
            FieldKey::EmployeeHsa => "employee_hsa",
            FieldKey::EmployerHsaMatch => "employer_hsa_match",
            FieldKey::EmployeeFsa => "employee_fsa",
            FieldKey::EmployerFsaMatch => "employer_fsa_match",
            FieldKey::HealthInsurance => "health_insurance",
            FieldKey::DentalInsurance => "dental_insurance",
            FieldKey::VisionInsurance => "vision_insurance",
            FieldKey::PayPeriod => "pay_period",
            FieldKey::PayDate => "pay_date",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in label variants per field, highest priority first.
fn builtin_templates(key: FieldKey) -> &'static [&'static str] {
    match key {
        FieldKey::GrossAmount => &[
            r"gross\s+(?:pay|amount|earnings?|wages)<sep><amt>",
            r"total\s+(?:gross|earnings?|wages)<sep><amt>",
            r"gross<sep><amt>",
            r"earnings?<sep><amt>",
            r"\bwages<sep><amt>",
        ],
        FieldKey::NetAmount => &[
            r"net\s+(?:pay|amount)<sep><amt>",
            r"take[-\s]?home(?:\s+pay)?<sep><amt>",
            r"(?:net\s+)?check\s+amount<sep><amt>",
            r"\bnet<sep><amt>",
        ],
        FieldKey::FederalTax => &[
            r"federal\s+(?:income\s+)?tax<sep><amt>",
            r"fed(?:eral)?\s+(?:tax|withholding|w/h)<sep><amt>",
            r"\bfit<sep><amt>",
        ],
        FieldKey::StateTax => &[
            r"state\s+(?:income\s+)?tax<sep><amt>",
            r"state\s+(?:withholding|w/h)<sep><amt>",
            r"\bsit<sep><amt>",
        ],
        FieldKey::SocialSecurity => &[
            r"social\s+security(?:\s+tax)?<sep><amt>",
            r"fica\s+(?:ss|soc(?:ial)?\s+sec(?:urity)?)<sep><amt>",
            r"soc\s+sec<sep><amt>",
            r"\boasdi<sep><amt>",
        ],
        FieldKey::Medicare => &[
            r"medicare(?:\s+tax)?<sep><amt>",
            r"fica\s+med(?:icare)?<sep><amt>",
        ],
        FieldKey::Employee401k => &[
            r"\b(?:employee|emp|ee)\s+<401k><sep><amt>",
            r"<401k>\s+(?:employee|ee)(?:\s+(?:contrib(?:ution)?|deferral))?<sep><amt>",
            r"<401k>\s+(?:contrib(?:ution)?|deduction|deferral)<sep><amt>",
            r"<401k>\s+deferred<sep><amt>",
            r"\b<401k><sep><amt>",
        ],
        FieldKey::Employer401kMatch => &[
            r"\b(?:employer|company|er)\s+<401k>\s+match<sep><amt>",
            r"<401k>\s+(?:employer|company|er)\s+match<sep><amt>",
            r"<401k>\s+match<sep><amt>",
            r"match\s+<401k><sep><amt>",
            r"\b(?:employer|company|er)\s+<401k>(?:\s+contrib(?:ution)?)?<sep><amt>",
        ],
        FieldKey::EmployeeHsa => &[
            r"\b(?:employee|emp|ee)\s+hsa<sep><amt>",
            r"hsa\s+(?:employee|ee)(?:\s+contrib(?:ution)?)?<sep><amt>",
            r"hsa\s+(?:contrib(?:ution)?|deduction|deferral)<sep><amt>",
            r"\bhsa<sep><amt>",
        ],
        FieldKey::EmployerHsaMatch => &[
            r"\b(?:employer|company|er)\s+hsa(?:\s+(?:match|contrib(?:ution)?))?<sep><amt>",
            r"hsa\s+(?:employer|company|er)(?:\s+(?:match|contrib(?:ution)?))?<sep><amt>",
            r"hsa\s+match<sep><amt>",
        ],
        FieldKey::EmployeeFsa => &[
            r"\b(?:employee|emp|ee)\s+fsa<sep><amt>",
            r"fsa\s+(?:employee|ee)(?:\s+contrib(?:ution)?)?<sep><amt>",
            r"fsa\s+(?:contrib(?:ution)?|deduction|deferral)<sep><amt>",
            r"\bfsa<sep><amt>",
        ],
        FieldKey::EmployerFsaMatch => &[
            r"\b(?:employer|company|er)\s+fsa(?:\s+(?:match|contrib(?:ution)?))?<sep><amt>",
            r"fsa\s+(?:employer|company|er)(?:\s+(?:match|contrib(?:ution)?))?<sep><amt>",
            r"fsa\s+match<sep><amt>",
        ],
        FieldKey::HealthInsurance => &[
            r"health\s+(?:insurance|ins\.?)<sep><amt>",
            r"medical\s+(?:insurance|ins\.?)<sep><amt>",
            r"health\s+deduction<sep><amt>",
            r"\bmedical(?:\s+plan)?<sep><amt>",
        ],
        FieldKey::DentalInsurance => &[
            r"dental\s+(?:insurance|ins\.?|plan)<sep><amt>",
            r"\bdental<sep><amt>",
        ],
        FieldKey::VisionInsurance => &[
            r"vision\s+(?:insurance|ins\.?|plan)<sep><amt>",
            r"\bvision<sep><amt>",
        ],
        FieldKey::PayPeriod => &[
            r"pay\s+period\s*:?\s*<range>",
            r"period\s*:?\s*<range>",
            r"(?:from|dates?)\s*:?\s*<range>",
        ],
        FieldKey::PayDate => &[
            r"pay\s+date\s*:?\s*<date>",
            r"check\s+date\s*:?\s*<date>",
            r"advice\s+date\s*:?\s*<date>",
            r"date\s*:?\s*<date>",
        ],
    }
}

/// Structural patterns tried for net pay before the generic labels.
const NET_PRIORITY_TEMPLATES: &[&str] = &[
    // Net pay printed right after the post-tax deductions total.
    r"post[-\s]?tax\s+deductions?<sep>-?[\d,]+\.\d{2}\s+\$\s?<amt>",
    // Amount followed by a currency unit, as on the check stub.
    r"\$\s?<amt>\s*(?:usd|dollars)\b",
];

/// How far after a payee marker the amount may appear.
const PAYEE_CONTEXT_SPAN: usize = 80;

fn compile(field: &str, source: &str) -> Result<Regex, ExtractionError> {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .map_err(|e| ExtractionError::InvalidPattern {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

/// An ordered sequence of candidate patterns for one field.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    /// Compile catalog templates, keeping their order.
    pub fn from_templates(field: &str, templates: &[&str]) -> Result<Self, ExtractionError> {
        let patterns = templates
            .iter()
            .map(|t| compile(field, &expand(t)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Append a pattern with the lowest priority.
    pub fn push(&mut self, pattern: Regex) {
        self.patterns.push(pattern);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Regex> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Capture group of the first pattern, in list order, that matches.
    pub fn find_first_match<'t>(&self, text: &'t str) -> Option<FieldMatch<&'t str>> {
        self.patterns
            .iter()
            .enumerate()
            .find_map(|(index, pattern)| capture(pattern, index, text))
    }

    /// First capture of every pattern that matches, in list order.
    pub fn find_each_match<'t>(&self, text: &'t str) -> Vec<FieldMatch<&'t str>> {
        self.patterns
            .iter()
            .enumerate()
            .filter_map(|(index, pattern)| capture(pattern, index, text))
            .collect()
    }
}

fn capture<'t>(pattern: &Regex, index: usize, text: &'t str) -> Option<FieldMatch<&'t str>> {
    let caps = pattern.captures(text)?;
    let group = caps.get(1).or_else(|| caps.get(0))?;
    Some(FieldMatch::new(group.as_str(), index))
}

/// Per-field pattern lists plus the net pay context patterns.
///
/// Built once and shared read-only; extraction never mutates it.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    fields: BTreeMap<FieldKey, PatternList>,
    net_priority: PatternList,
    payee_context: Option<Regex>,
}

impl PatternCatalog {
    /// Catalog with the built-in patterns only.
    pub fn builtin() -> Result<Self, ExtractionError> {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Catalog with built-in patterns, configured custom patterns appended
    /// after them, and the payee context built from the configured markers.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let mut fields = BTreeMap::new();
        for key in FieldKey::ALL {
            let list = PatternList::from_templates(key.as_str(), builtin_templates(key))?;
            fields.insert(key, list);
        }

        for custom in &config.custom_patterns {
            let regex = compile(custom.field.as_str(), &custom.pattern)?;
            fields.entry(custom.field).or_default().push(regex);
        }

        let net_priority = PatternList::from_templates("net_priority", NET_PRIORITY_TEMPLATES)?;
        let payee_context = payee_context_pattern(&config.payee_markers)?;

        Ok(Self {
            fields,
            net_priority,
            payee_context,
        })
    }

    /// Patterns for a field, empty if the field has none.
    pub fn patterns(&self, key: FieldKey) -> Option<&PatternList> {
        self.fields.get(&key)
    }

    /// First match for a field in catalog order.
    pub fn find_first<'t>(&self, key: FieldKey, text: &'t str) -> Option<FieldMatch<&'t str>> {
        self.fields.get(&key)?.find_first_match(text)
    }

    pub fn net_priority(&self) -> &PatternList {
        &self.net_priority
    }

    pub fn payee_context(&self) -> Option<&Regex> {
        self.payee_context.as_ref()
    }
}

fn payee_context_pattern(markers: &[String]) -> Result<Option<Regex>, ExtractionError> {
    let alternatives: Vec<String> = markers
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .map(|m| regex::escape(&m))
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let source = format!(
        r"(?:{})[^$]{{0,{}}}\$\s?{}",
        alternatives.join("|"),
        PAYEE_CONTEXT_SPAN,
        AMOUNT
    );
    compile("payee_context", &source).map(Some)
}
