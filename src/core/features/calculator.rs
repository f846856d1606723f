//! Health and finance calculators
//!
//! Closed-form Body Mass Index and Equated Monthly Installment, with the same
//! finite-input checks the converters apply.

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{BmiReport, EmiReport};

fn require_finite(name: &str, value: f64) -> AppResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppError::InvalidInput(format!("{} must be a finite number", name)))
    }
}

/// BMI category, lower bounds inclusive
pub fn bmi_status(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "Underweight"
    } else if bmi < 24.9 {
        "Normal weight"
    } else if bmi < 29.9 {
        "Overweight"
    } else {
        "Obese"
    }
}

/// Body Mass Index from weight in kilograms and height in centimeters
pub fn bmi(weight_kg: f64, height_cm: f64) -> AppResult<BmiReport> {
    let weight = require_finite("weight", weight_kg)?;
    let height_cm = require_finite("height", height_cm)?;
    if weight <= 0.0 || height_cm <= 0.0 {
        return Err(AppError::InvalidInput("weight and height must be positive".into()));
    }

    let height_m = height_cm / 100.0;
    let bmi = weight / (height_m * height_m);

    Ok(BmiReport {
        bmi,
        status: bmi_status(bmi).to_string(),
    })
}

/// Monthly installment for `principal` at `annual_rate_percent` over `months`
pub fn emi(principal: f64, annual_rate_percent: f64, months: f64) -> AppResult<EmiReport> {
    let principal = require_finite("principal", principal)?;
    let annual = require_finite("rate", annual_rate_percent)?;
    let months = require_finite("months", months)?;
    if principal < 0.0 || annual < 0.0 {
        return Err(AppError::InvalidInput("principal and rate cannot be negative".into()));
    }
    if months <= 0.0 {
        return Err(AppError::InvalidInput("months must be positive".into()));
    }

    let r = annual / 100.0 / 12.0;
    // (1+r)^n - 1, accurate when r is tiny
    let growth_m1 = (months * r.ln_1p()).exp_m1();
    let emi = if growth_m1 == 0.0 {
        principal / months
    } else {
        principal * r * (growth_m1 + 1.0) / growth_m1
    };
    if !emi.is_finite() {
        return Err(AppError::InvalidInput("installment is out of range".into()));
    }
    let total_payment = emi * months;

    Ok(EmiReport {
        emi,
        monthly_rate: r,
        total_payment,
        total_interest: total_payment - principal,
    })
}

pub fn format_bmi(report: &BmiReport) -> String {
    format!("BMI: {:.2} ({})", report.bmi, report.status)
}

pub fn format_emi(report: &EmiReport) -> String {
    format!("EMI: {:.2}", report.emi)
}
