//! # Report Module
//!
//! Human-readable score card for the CLI.
//!
//! A report gathers what the engine knows about one tree:
//! - species traits
//! - the Chave biomass result
//! - optionally, a score under a snapshot and a growth projection

use crate::chave::{AnnualSequestration, ChaveResult, compute_chave_result};
use crate::score::CarbonCreditScore;
use crate::species::TreeSpecies;
use serde::{Deserialize, Serialize};

const CARD_WIDTH: usize = 41;

/// Everything shown on a score card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub species_key: String,
    pub species: TreeSpecies,
    pub chave: ChaveResult,
    #[serde(default)]
    pub score: Option<CarbonCreditScore>,
    #[serde(default)]
    pub projection: Option<AnnualSequestration>,
}

impl ScoreReport {
    /// Start a report from a species; the Chave result is computed here.
    #[must_use]
    pub fn new(species_key: impl Into<String>, species: &TreeSpecies) -> Self {
        Self {
            species_key: species_key.into(),
            species: species.clone(),
            chave: compute_chave_result(species),
            score: None,
            projection: None,
        }
    }

    /// Attach a score.
    #[must_use]
    pub fn with_score(mut self, score: CarbonCreditScore) -> Self {
        self.score = Some(score);
        self
    }

    /// Attach a growth projection.
    #[must_use]
    pub fn with_projection(mut self, projection: AnnualSequestration) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Format as a boxed text card.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let rule = "─".repeat(CARD_WIDTH);

        output.push_str(&format!("┌{rule}┐\n"));
        push_line(
            &mut output,
            &format!("{} ({})", self.species.name, self.species.scientific_name),
        );
        push_line(
            &mut output,
            &format!(
                "ρ {} g/cm³  DBH {} cm  H {} m",
                self.species.wood_density, self.species.avg_dbh, self.species.avg_height
            ),
        );

        output.push_str(&format!("├{rule}┤\n"));
        push_line(&mut output, "BIOMASS (Chave pantropical)");
        push_line(&mut output, &format!("AGB            {:>10.2} kg", self.chave.agb));
        push_line(&mut output, &format!("Carbon stored  {:>10.2} kg", self.chave.carbon_stored));
        push_line(&mut output, &format!("CO2 equivalent {:>10.2} kg", self.chave.co2_sequestered));
        push_line(&mut output, &format!("Credits        {:>10.4} t", self.chave.carbon_credits));
        push_line(&mut output, &format!("Value          {:>10.2} USD", self.chave.credit_value_usd));

        if let Some(projection) = &self.projection {
            output.push_str(&format!("├{rule}┤\n"));
            push_line(
                &mut output,
                &format!(
                    "GROWTH ({} forest, {}% DBH/yr)",
                    projection.forest_type,
                    projection.dbh_growth_rate * 100.0
                ),
            );
            push_line(&mut output, &format!("CO2 per year   {:>10.2} kg", projection.annual_co2_kg));
            push_line(&mut output, &format!("CO2 per month  {:>10.2} kg", projection.monthly_co2_kg));
        }

        output.push_str(&format!("├{rule}┤\n"));
        match &self.score {
            None => push_line(&mut output, "SCORE - (no sensor snapshot)"),
            Some(score) => {
                push_line(
                    &mut output,
                    &format!("SCORE {}/100  grade {}", score.total_score, score.grade),
                );
                let b = &score.breakdown;
                push_line(&mut output, &format!("Sequestration  {:>3}", b.sequestration_score));
                push_line(&mut output, &format!("Emission off.  {:>3}", b.emission_offset));
                push_line(&mut output, &format!("Env. health    {:>3}", b.environmental_health));
                push_line(&mut output, &format!("Oxygen         {:>3}", b.oxygen_production));
                push_line(&mut output, &format!("Earned  {:.4} t = {:.2} USD", score.credits_earned, score.credit_value_usd));
                push_line(&mut output, &format!("Net balance    {:+.2} ppm", score.net_carbon_balance));
            }
        }

        output.push_str(&format!("└{rule}┘\n"));
        output
    }
}

fn push_line(output: &mut String, text: &str) {
    let used = text.chars().count() + 1;
    let pad = CARD_WIDTH.saturating_sub(used);
    output.push_str(&format!("│ {text}{}│\n", " ".repeat(pad)));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chave::{ForestType, annual_sequestration};
    use crate::score::compute_carbon_credit_score;
    use crate::sensor::SensorData;
    use crate::species::SpeciesCatalog;
    use chrono::{TimeZone, Utc};

    fn neem() -> TreeSpecies {
        SpeciesCatalog::builtin().get("neem").cloned().unwrap()
    }

    #[test]
    fn report_without_score() {
        let text = ScoreReport::new("neem", &neem()).to_text();
        assert!(text.contains("Neem (Azadirachta indica)"));
        assert!(text.contains("1102.67"));
        assert!(text.contains("1.9003"));
        assert!(text.contains("no sensor snapshot"));
        assert!(!text.contains("GROWTH"));
    }

    #[test]
    fn report_with_score_and_projection() {
        let species = neem();
        let sensor = SensorData::baseline(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let report = ScoreReport::new("neem", &species)
            .with_score(compute_carbon_credit_score(&sensor, &species))
            .with_projection(annual_sequestration(&species, ForestType::Wet, 0.02));
        let text = report.to_text();
        assert!(text.contains("SCORE 100/100  grade A+"));
        assert!(text.contains("GROWTH (wet forest, 2% DBH/yr)"));
        assert!(text.contains("-27.00 ppm"));
    }

    #[test]
    fn lines_are_boxed() {
        let text = ScoreReport::new("neem", &neem()).to_text();
        for line in text.lines() {
            assert!(line.starts_with('┌') || line.starts_with('│') || line.starts_with('├') || line.starts_with('└'));
        }
    }

    #[test]
    fn report_serializes() {
        let json = serde_json::to_value(ScoreReport::new("neem", &neem())).unwrap();
        assert_eq!(json["speciesKey"], "neem");
        assert_eq!(json["chave"]["agb"], 1102.67);
        assert!(json["score"].is_null());
    }
}
