use serde_json::{json, Map, Value};

use crate::style::color::Color;
use crate::style::expression::{EvaluationContext, Expression, StepExpression};

/// A paint or layout property: a constant, or an expression the engine
/// evaluates per feature
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Constant(Value),
    Expression(Expression),
}

impl PropertyValue {
    pub fn constant(value: impl Into<Value>) -> Self {
        PropertyValue::Constant(value.into())
    }

    pub fn color(color: Color) -> Self {
        PropertyValue::Constant(Value::String(color.to_string()))
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            PropertyValue::Expression(expression) => Some(expression),
            PropertyValue::Constant(_) => None,
        }
    }

    pub fn as_step(&self) -> Option<&StepExpression> {
        self.as_expression().and_then(Expression::as_step)
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        match self {
            PropertyValue::Constant(value) => value.clone(),
            PropertyValue::Expression(expression) => expression.evaluate(ctx),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Constant(value) => value.clone(),
            PropertyValue::Expression(expression) => expression.to_json(),
        }
    }
}

impl From<Expression> for PropertyValue {
    fn from(expression: Expression) -> Self {
        PropertyValue::Expression(expression)
    }
}

impl From<StepExpression> for PropertyValue {
    fn from(step: StepExpression) -> Self {
        PropertyValue::Expression(Expression::Step(step))
    }
}

fn insert(map: &mut Map<String, Value>, key: &str, value: &Option<PropertyValue>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.to_json());
    }
}

/// Circle layer: one filled, stroked circle per feature
#[derive(Debug, Clone, PartialEq)]
pub struct CircleLayer {
    pub id: String,
    pub source: String,
    pub filter: Option<Expression>,
    pub circle_radius: Option<PropertyValue>,
    pub circle_color: Option<PropertyValue>,
    pub circle_opacity: Option<PropertyValue>,
    pub circle_stroke_width: Option<PropertyValue>,
    pub circle_stroke_color: Option<PropertyValue>,
}

impl CircleLayer {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            filter: None,
            circle_radius: None,
            circle_color: None,
            circle_opacity: None,
            circle_stroke_width: None,
            circle_stroke_color: None,
        }
    }

    fn paint(&self) -> Map<String, Value> {
        let mut paint = Map::new();
        insert(&mut paint, "circle-radius", &self.circle_radius);
        insert(&mut paint, "circle-color", &self.circle_color);
        insert(&mut paint, "circle-opacity", &self.circle_opacity);
        insert(&mut paint, "circle-stroke-width", &self.circle_stroke_width);
        insert(&mut paint, "circle-stroke-color", &self.circle_stroke_color);
        paint
    }
}

/// Symbol layer: text and/or an icon per feature
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolLayer {
    pub id: String,
    pub source: String,
    pub filter: Option<Expression>,
    pub text_field: Option<PropertyValue>,
    pub text_size: Option<PropertyValue>,
    pub text_font: Option<PropertyValue>,
    pub text_color: Option<PropertyValue>,
    pub icon_image: Option<PropertyValue>,
    pub icon_size: Option<PropertyValue>,
    pub icon_allow_overlap: Option<PropertyValue>,
}

impl SymbolLayer {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            filter: None,
            text_field: None,
            text_size: None,
            text_font: None,
            text_color: None,
            icon_image: None,
            icon_size: None,
            icon_allow_overlap: None,
        }
    }

    fn layout(&self) -> Map<String, Value> {
        let mut layout = Map::new();
        insert(&mut layout, "text-field", &self.text_field);
        insert(&mut layout, "text-size", &self.text_size);
        insert(&mut layout, "text-font", &self.text_font);
        insert(&mut layout, "icon-image", &self.icon_image);
        insert(&mut layout, "icon-size", &self.icon_size);
        insert(&mut layout, "icon-allow-overlap", &self.icon_allow_overlap);
        layout
    }

    fn paint(&self) -> Map<String, Value> {
        let mut paint = Map::new();
        insert(&mut paint, "text-color", &self.text_color);
        paint
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Circle,
    Symbol,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Circle => write!(f, "circle"),
            LayerKind::Symbol => write!(f, "symbol"),
        }
    }
}

/// Immutable description of a style layer handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum StyleLayer {
    Circle(CircleLayer),
    Symbol(SymbolLayer),
}

impl StyleLayer {
    pub fn id(&self) -> &str {
        match self {
            StyleLayer::Circle(layer) => &layer.id,
            StyleLayer::Symbol(layer) => &layer.id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            StyleLayer::Circle(layer) => &layer.source,
            StyleLayer::Symbol(layer) => &layer.source,
        }
    }

    pub fn filter(&self) -> Option<&Expression> {
        match self {
            StyleLayer::Circle(layer) => layer.filter.as_ref(),
            StyleLayer::Symbol(layer) => layer.filter.as_ref(),
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            StyleLayer::Circle(_) => LayerKind::Circle,
            StyleLayer::Symbol(_) => LayerKind::Symbol,
        }
    }

    /// Whether the layer draws this feature at the given zoom
    pub fn accepts(&self, feature: &crate::data::geojson::Feature, zoom: f64) -> bool {
        self.filter()
            .map_or(true, |filter| filter.matches_feature(feature, zoom))
    }

    /// Style-spec JSON form
    pub fn to_style_json(&self) -> Value {
        let (layout, paint) = match self {
            StyleLayer::Circle(layer) => (Map::new(), layer.paint()),
            StyleLayer::Symbol(layer) => (layer.layout(), layer.paint()),
        };

        let mut json = json!({
            "id": self.id(),
            "type": self.kind().to_string(),
            "source": self.source(),
        });
        if let Some(filter) = self.filter() {
            json["filter"] = filter.to_json();
        }
        if !layout.is_empty() {
            json["layout"] = Value::Object(layout);
        }
        if !paint.is_empty() {
            json["paint"] = Value::Object(paint);
        }
        json
    }
}

impl From<CircleLayer> for StyleLayer {
    fn from(layer: CircleLayer) -> Self {
        StyleLayer::Circle(layer)
    }
}

impl From<SymbolLayer> for StyleLayer {
    fn from(layer: SymbolLayer) -> Self {
        StyleLayer::Symbol(layer)
    }
}

/// Where a layer goes in the style stack
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayerPosition {
    /// On top of every existing layer
    #[default]
    Default,
    Above(String),
    Below(String),
    At(usize),
}
