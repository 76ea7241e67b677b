//! Pilot deal check: a pure threshold comparison of deal economics against the
//! pricing floor. Shares no state with the run pipeline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricingFloor {
    pub onboarding_fee: f64,
    pub monthly_fee: f64,
    pub included_questionnaires: u32,
    pub overage_fee: f64,
    pub gross_margin_floor: f64,
}

pub const PILOT_PRICING_FLOOR: PricingFloor = PricingFloor {
    onboarding_fee: 2000.0,
    monthly_fee: 1800.0,
    included_questionnaires: 12,
    overage_fee: 150.0,
    gross_margin_floor: 0.70,
};

impl Default for PricingFloor {
    fn default() -> Self {
        PILOT_PRICING_FLOOR
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DealInput {
    pub onboarding_fee: f64,
    pub monthly_fee: f64,
    pub included_questionnaires: u32,
    pub overage_fee: f64,
    pub expected_questionnaires: u32,
    pub estimated_cogs_per_questionnaire: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Projection {
    pub monthly_revenue: f64,
    pub monthly_cogs: f64,
    pub gross_margin: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingVerdict {
    pub pricing_floor: PricingFloor,
    pub deal: DealInput,
    pub projection: Projection,
    pub approved: bool,
    pub issues: Vec<String>,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn fmt_money(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn raw_margin(revenue: f64, cogs: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        (revenue - cogs) / revenue
    }
}

/// Revenue and cost projection. `gross_margin` is rounded to 4 places for display only;
/// the floor check uses the unrounded value.
pub fn project(deal: &DealInput) -> Projection {
    let overage = deal
        .expected_questionnaires
        .saturating_sub(deal.included_questionnaires);
    let monthly_revenue = deal.monthly_fee + f64::from(overage) * deal.overage_fee;
    let monthly_cogs = f64::from(deal.expected_questionnaires) * deal.estimated_cogs_per_questionnaire;
    Projection {
        monthly_revenue,
        monthly_cogs,
        gross_margin: round4(raw_margin(monthly_revenue, monthly_cogs)),
    }
}

pub fn evaluate_deal(deal: DealInput, floor: PricingFloor) -> PricingVerdict {
    let projection = project(&deal);
    let mut issues = Vec::new();

    if deal.onboarding_fee < floor.onboarding_fee {
        issues.push(format!(
            "Onboarding fee below floor (${}).",
            fmt_money(floor.onboarding_fee)
        ));
    }
    if deal.monthly_fee < floor.monthly_fee {
        issues.push(format!(
            "Monthly fee below floor (${}).",
            fmt_money(floor.monthly_fee)
        ));
    }
    if deal.included_questionnaires > floor.included_questionnaires {
        issues.push(format!(
            "Included questionnaires exceed floor package limit ({}), hurting margin.",
            floor.included_questionnaires
        ));
    }
    if deal.overage_fee < floor.overage_fee {
        issues.push(format!(
            "Overage fee below floor (${}).",
            fmt_money(floor.overage_fee)
        ));
    }
    if raw_margin(projection.monthly_revenue, projection.monthly_cogs) < floor.gross_margin_floor {
        issues.push(format!(
            "Projected gross margin below floor ({:.0}%).",
            floor.gross_margin_floor * 100.0
        ));
    }

    PricingVerdict {
        pricing_floor: floor,
        deal,
        projection,
        approved: issues.is_empty(),
        issues,
    }
}

/// Evaluate against the standard pilot floor.
pub fn evaluate_pilot_deal(deal: DealInput) -> PricingVerdict {
    evaluate_deal(deal, PILOT_PRICING_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn floor_deal() -> DealInput {
        DealInput {
            onboarding_fee: 2000.0,
            monthly_fee: 1800.0,
            included_questionnaires: 12,
            overage_fee: 150.0,
            expected_questionnaires: 10,
            estimated_cogs_per_questionnaire: 40.0,
        }
    }

    #[test]
    fn floor_deal_is_approved() {
        let verdict = evaluate_pilot_deal(floor_deal());
        assert!(verdict.approved);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.projection.monthly_revenue, 1800.0);
        assert_eq!(verdict.projection.monthly_cogs, 400.0);
        assert_eq!(verdict.projection.gross_margin, 0.7778);
    }

    #[test]
    fn overage_counts_only_questionnaires_above_included() {
        let deal = DealInput {
            expected_questionnaires: 15,
            ..floor_deal()
        };
        let projection = project(&deal);
        assert_eq!(projection.monthly_revenue, 1800.0 + 3.0 * 150.0);
        assert_eq!(projection.monthly_cogs, 600.0);
    }

    #[test]
    fn zero_revenue_has_zero_margin() {
        let deal = DealInput {
            monthly_fee: 0.0,
            expected_questionnaires: 0,
            ..floor_deal()
        };
        assert_eq!(project(&deal).gross_margin, 0.0);
    }

    #[test]
    fn margin_just_below_floor_is_rejected_even_when_it_rounds_up() {
        let deal = DealInput {
            expected_questionnaires: 12,
            estimated_cogs_per_questionnaire: 45.006,
            ..floor_deal()
        };
        let verdict = evaluate_pilot_deal(deal);
        assert_eq!(verdict.projection.gross_margin, 0.7);
        assert!(!verdict.approved);
        assert_eq!(
            verdict.issues,
            vec!["Projected gross margin below floor (70%).".to_string()]
        );
    }

    #[test]
    fn every_violation_is_itemized_in_order() {
        let deal = DealInput {
            onboarding_fee: 500.0,
            monthly_fee: 900.0,
            included_questionnaires: 20,
            overage_fee: 100.0,
            expected_questionnaires: 20,
            estimated_cogs_per_questionnaire: 60.0,
        };
        let verdict = evaluate_pilot_deal(deal);
        assert!(!verdict.approved);
        assert_eq!(
            verdict.issues,
            vec![
                "Onboarding fee below floor ($2000).".to_string(),
                "Monthly fee below floor ($1800).".to_string(),
                "Included questionnaires exceed floor package limit (12), hurting margin."
                    .to_string(),
                "Overage fee below floor ($150).".to_string(),
                "Projected gross margin below floor (70%).".to_string(),
            ]
        );
    }
}
