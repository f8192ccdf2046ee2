//! Declarative style expressions
//!
//! A small subset of the style-spec expression language, enough for
//! property-driven paint values and cluster filters. The tree is handed to
//! the rendering engine as JSON; [`Expression::evaluate`] exists so the same
//! rules can be checked against features on this side.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::data::geojson::{Feature, Properties};
use crate::{MapError, Result};

/// Inputs an expression can read
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    pub properties: Option<&'a Properties>,
    pub zoom: f64,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(properties: Option<&'a Properties>, zoom: f64) -> Self {
        Self { properties, zoom }
    }

    pub fn for_feature(feature: &'a Feature, zoom: f64) -> Self {
        Self::new(feature.properties.as_ref(), zoom)
    }
}

/// Interpolation curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolation {
    Linear,
    /// Exponential curve with the given base
    Exponential(f64),
}

impl Interpolation {
    fn to_json(self) -> Value {
        match self {
            Interpolation::Linear => json!(["linear"]),
            Interpolation::Exponential(base) => json!(["exponential", base]),
        }
    }

    /// Interpolation factor of `x` between `lower` and `upper`
    fn factor(self, x: f64, lower: f64, upper: f64) -> f64 {
        let span = upper - lower;
        let progress = x - lower;
        match self {
            Interpolation::Linear => progress / span,
            Interpolation::Exponential(base) if (base - 1.0).abs() < f64::EPSILON => {
                progress / span
            }
            Interpolation::Exponential(base) => {
                (base.powf(progress) - 1.0) / (base.powf(span) - 1.0)
            }
        }
    }
}

/// Piecewise-constant function of a numeric input.
///
/// Evaluates to the output of the greatest threshold `<=` the input, or the
/// base output when the input is below the first threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct StepExpression {
    input: Box<Expression>,
    base: Value,
    stops: Vec<(f64, Value)>,
}

impl StepExpression {
    pub fn new(input: Expression, base: impl Into<Value>, stops: Vec<(f64, Value)>) -> Result<Self> {
        ensure_increasing(stops.iter().map(|(t, _)| *t), "step")?;
        Ok(Self {
            input: Box::new(input),
            base: base.into(),
            stops,
        })
    }

    /// Pairs each threshold with the output at the same position of
    /// `outputs[1..]`; `outputs[0]` is the base.
    pub fn from_bands<V: Into<Value> + Clone>(
        input: Expression,
        thresholds: &[f64],
        outputs: &[V],
    ) -> Result<Self> {
        if outputs.len() != thresholds.len() + 1 {
            return Err(MapError::Config(format!(
                "step needs {} outputs for {} thresholds, got {}",
                thresholds.len() + 1,
                thresholds.len(),
                outputs.len()
            )));
        }
        let stops = thresholds
            .iter()
            .zip(&outputs[1..])
            .map(|(t, v)| (*t, v.clone().into()))
            .collect();
        Self::new(input, outputs[0].clone(), stops)
    }

    pub fn input(&self) -> &Expression {
        &self.input
    }

    pub fn base(&self) -> &Value {
        &self.base
    }

    pub fn stops(&self) -> &[(f64, Value)] {
        &self.stops
    }

    /// Output for a given input value
    pub fn value_for(&self, x: f64) -> &Value {
        self.stops
            .iter()
            .take_while(|(threshold, _)| *threshold <= x)
            .last()
            .map(|(_, value)| value)
            .unwrap_or(&self.base)
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        match self.input.evaluate(ctx).as_f64() {
            Some(x) => self.value_for(x).clone(),
            None => self.base.clone(),
        }
    }

    fn to_json(&self) -> Value {
        let mut array = vec![json!("step"), self.input.to_json(), self.base.clone()];
        for (threshold, value) in &self.stops {
            array.push(json!(threshold));
            array.push(value.clone());
        }
        Value::Array(array)
    }
}

/// Continuous numeric function of an input, clamped at the outer stops
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolateExpression {
    curve: Interpolation,
    input: Box<Expression>,
    stops: Vec<(f64, f64)>,
}

impl InterpolateExpression {
    pub fn new(curve: Interpolation, input: Expression, stops: Vec<(f64, f64)>) -> Result<Self> {
        if stops.is_empty() {
            return Err(MapError::Config(
                "interpolate needs at least one stop".to_string(),
            ));
        }
        ensure_increasing(stops.iter().map(|(t, _)| *t), "interpolate")?;
        Ok(Self {
            curve,
            input: Box::new(input),
            stops,
        })
    }

    pub fn value_for(&self, x: f64) -> f64 {
        let (first, last) = (self.stops[0], self.stops[self.stops.len() - 1]);
        // NaN compares false against every stop
        if x.is_nan() || x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        match self.stops.windows(2).find(|pair| x < pair[1].0) {
            Some(&[lo, hi]) => lo.1 + (hi.1 - lo.1) * self.curve.factor(x, lo.0, hi.0),
            _ => last.1,
        }
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        match self.input.evaluate(ctx).as_f64() {
            Some(x) => json!(self.value_for(x)),
            None => Value::Null,
        }
    }

    fn to_json(&self) -> Value {
        let mut array = vec![
            json!("interpolate"),
            self.curve.to_json(),
            self.input.to_json(),
        ];
        for (stop, output) in &self.stops {
            array.push(json!(stop));
            array.push(json!(output));
        }
        Value::Array(array)
    }
}

fn ensure_increasing(thresholds: impl Iterator<Item = f64>, kind: &str) -> Result<()> {
    let mut previous: Option<f64> = None;
    for t in thresholds {
        if !t.is_finite() || previous.is_some_and(|p| p >= t) {
            return Err(MapError::Config(format!(
                "{} thresholds must be finite and strictly increasing",
                kind
            )));
        }
        previous = Some(t);
    }
    Ok(())
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// Value of a feature property, null when absent
    Get(String),
    /// Whether a feature property is present
    Has(String),
    Not(Box<Expression>),
    /// Current zoom level
    Zoom,
    Step(StepExpression),
    Interpolate(InterpolateExpression),
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn get(property: impl Into<String>) -> Self {
        Expression::Get(property.into())
    }

    pub fn has(property: impl Into<String>) -> Self {
        Expression::Has(property.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    pub fn as_step(&self) -> Option<&StepExpression> {
        match self {
            Expression::Step(step) => Some(step),
            _ => None,
        }
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        match self {
            Expression::Literal(value) => value.clone(),
            Expression::Get(key) => ctx
                .properties
                .and_then(|p| p.get(key))
                .cloned()
                .unwrap_or(Value::Null),
            Expression::Has(key) => {
                Value::Bool(ctx.properties.is_some_and(|p| p.contains_key(key)))
            }
            Expression::Not(inner) => Value::Bool(!inner.matches(ctx)),
            Expression::Zoom => json!(ctx.zoom),
            Expression::Step(step) => step.evaluate(ctx),
            Expression::Interpolate(interpolate) => interpolate.evaluate(ctx),
        }
    }

    /// Evaluates as a filter; anything but `true` rejects
    pub fn matches(&self, ctx: &EvaluationContext<'_>) -> bool {
        self.evaluate(ctx) == Value::Bool(true)
    }

    /// Filter check against a feature at the given zoom
    pub fn matches_feature(&self, feature: &Feature, zoom: f64) -> bool {
        self.matches(&EvaluationContext::for_feature(feature, zoom))
    }

    /// Style-spec JSON form
    pub fn to_json(&self) -> Value {
        match self {
            Expression::Literal(value) if value.is_array() || value.is_object() => {
                json!(["literal", value])
            }
            Expression::Literal(value) => value.clone(),
            Expression::Get(key) => json!(["get", key]),
            Expression::Has(key) => json!(["has", key]),
            Expression::Not(inner) => json!(["!", inner.to_json()]),
            Expression::Zoom => json!(["zoom"]),
            Expression::Step(step) => step.to_json(),
            Expression::Interpolate(interpolate) => interpolate.to_json(),
        }
    }
}

impl From<StepExpression> for Expression {
    fn from(step: StepExpression) -> Self {
        Expression::Step(step)
    }
}

impl From<InterpolateExpression> for Expression {
    fn from(interpolate: InterpolateExpression) -> Self {
        Expression::Interpolate(interpolate)
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    fn radius_step() -> StepExpression {
        StepExpression::from_bands(Expression::get("point_count"), &[9.0, 99.0], &[16.0, 24.0, 40.0])
            .unwrap()
    }

    #[test]
    fn test_step_bands() {
        let step = radius_step();
        assert_eq!(step.value_for(5.0), &json!(16.0));
        assert_eq!(step.value_for(9.0), &json!(24.0));
        assert_eq!(step.value_for(98.0), &json!(24.0));
        assert_eq!(step.value_for(99.0), &json!(40.0));
        assert_eq!(step.value_for(150.0), &json!(40.0));
        assert_eq!(step.value_for(-1.0), &json!(16.0));
    }

    #[test]
    fn test_step_rejects_unordered_thresholds() {
        let err = StepExpression::new(
            Expression::get("point_count"),
            1,
            vec![(99.0, json!(2)), (9.0, json!(3))],
        )
        .unwrap_err();
        assert!(matches!(err, MapError::Config(_)));

        let duplicate = StepExpression::new(
            Expression::get("point_count"),
            1,
            vec![(9.0, json!(2)), (9.0, json!(3))],
        );
        assert!(duplicate.is_err());

        let short = StepExpression::from_bands(Expression::Zoom, &[1.0], &[1.0]);
        assert!(short.is_err());
    }

    #[test]
    fn test_step_evaluates_feature_property() {
        let expression = Expression::from(radius_step());
        let cluster = props(json!({ "point_count": 150 }));
        let ctx = EvaluationContext::new(Some(&cluster), 3.0);
        assert_eq!(expression.evaluate(&ctx), json!(40.0));

        // Missing input falls back to the base output
        let ctx = EvaluationContext::new(None, 3.0);
        assert_eq!(expression.evaluate(&ctx), json!(16.0));
    }

    #[test]
    fn test_has_and_not_are_complementary() {
        let has = Expression::has("point_count");
        let not_has = Expression::not(Expression::has("point_count"));
        let cluster = props(json!({ "point_count": 1 }));
        let plain = props(json!({ "name": "pad" }));

        for properties in [Some(&cluster), Some(&plain), None] {
            let ctx = EvaluationContext::new(properties, 0.0);
            assert_ne!(has.matches(&ctx), not_has.matches(&ctx));
        }
    }

    #[test]
    fn test_interpolate() {
        let linear = InterpolateExpression::new(
            Interpolation::Linear,
            Expression::Zoom,
            vec![(0.0, 2.0), (10.0, 12.0)],
        )
        .unwrap();
        assert_eq!(linear.value_for(-3.0), 2.0);
        assert_eq!(linear.value_for(5.0), 7.0);
        assert_eq!(linear.value_for(20.0), 12.0);

        let exponential = InterpolateExpression::new(
            Interpolation::Exponential(2.0),
            Expression::Zoom,
            vec![(0.0, 0.0), (2.0, 3.0)],
        )
        .unwrap();
        assert!((exponential.value_for(1.0) - 1.0).abs() < 1e-12);

        assert!(InterpolateExpression::new(Interpolation::Linear, Expression::Zoom, vec![]).is_err());
    }

    #[test]
    fn test_interpolate_nan_input() {
        let linear = InterpolateExpression::new(
            Interpolation::Linear,
            Expression::Zoom,
            vec![(0.0, 1.0), (10.0, 2.0)],
        )
        .unwrap();
        assert_eq!(linear.value_for(f64::NAN), 1.0);

        let single =
            InterpolateExpression::new(Interpolation::Linear, Expression::Zoom, vec![(4.0, 9.0)])
                .unwrap();
        assert_eq!(single.value_for(f64::NAN), 9.0);
        assert_eq!(single.value_for(100.0), 9.0);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(
            Expression::from(radius_step()).to_json(),
            json!(["step", ["get", "point_count"], 16.0, 9.0, 24.0, 99.0, 40.0])
        );
        assert_eq!(
            Expression::not(Expression::has("point_count")).to_json(),
            json!(["!", ["has", "point_count"]])
        );
        assert_eq!(
            Expression::literal(json!(["Montserrat Bold"])).to_json(),
            json!(["literal", ["Montserrat Bold"]])
        );
        let interpolate = InterpolateExpression::new(
            Interpolation::Exponential(1.5),
            Expression::Zoom,
            vec![(5.0, 1.0)],
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(Expression::from(interpolate)).unwrap(),
            json!(["interpolate", ["exponential", 1.5], ["zoom"], 5.0, 1.0])
        );
    }
}
