//! Declarative feature filters. The same tree is either encoded for Earth Engine or
//! evaluated locally against GeoJSON features.

use serde_json::{json, Value};

use super::{BoundingBox, Feature};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Feature geometry intersects the rectangle.
    Bounds(BoundingBox),
    /// Numeric property within `[min, max]`, both ends inclusive.
    RangeContains { field: String, min: f64, max: f64 },
    /// Property equal to the value.
    Equals { field: String, value: Value },
    Or(Vec<Filter>),
    And(Vec<Filter>),
}

impl Filter {
    pub fn range_contains(field: &str, min: i64, max: i64) -> Self {
        Filter::RangeContains {
            field: field.to_string(),
            min: min as f64,
            max: max as f64,
        }
    }

    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Filter::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Filter::Bounds(bbox) => feature.intersects(bbox),
            Filter::RangeContains { field, min, max } => feature
                .property(field)
                .and_then(Value::as_f64)
                .map(|v| *min <= v && v <= *max)
                .unwrap_or(false),
            Filter::Equals { field, value } => feature
                .property(field)
                .map(|v| values_equal(v, value))
                .unwrap_or(false),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(feature)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(feature)),
        }
    }

    /// Earth Engine `Filter.*` invocation for this filter.
    pub fn to_expression(&self) -> Value {
        match self {
            Filter::Bounds(bbox) => invocation(
                "Filter.intersects",
                json!({
                    "leftField": constant(".all"),
                    "rightValue": invocation(
                        "GeometryConstructors.Polygon",
                        json!({
                            "coordinates": constant(json!([bbox.ring()])),
                            "geodesic": constant(false),
                        }),
                    ),
                }),
            ),
            Filter::RangeContains { field, min, max } => invocation(
                "Filter.rangeContains",
                json!({
                    "field": constant(field.as_str()),
                    "minValue": constant(*min),
                    "maxValue": constant(*max),
                }),
            ),
            Filter::Equals { field, value } => invocation(
                "Filter.equals",
                json!({
                    "leftField": constant(field.as_str()),
                    "rightValue": constant(value.clone()),
                }),
            ),
            Filter::Or(filters) => combine("Filter.or", filters),
            Filter::And(filters) => combine("Filter.and", filters),
        }
    }
}

pub fn constant(value: impl Into<Value>) -> Value {
    json!({ "constantValue": value.into() })
}

pub fn invocation(function: &str, arguments: Value) -> Value {
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

fn combine(function: &str, filters: &[Filter]) -> Value {
    let values: Vec<Value> = filters.iter().map(Filter::to_expression).collect();
    invocation(function, json!({ "filters": { "arrayValue": { "values": values } } }))
}

// Numbers compare by value so 1.0 == 1, everything else structurally.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mtbs::tests::feature;

    #[test]
    fn should_match_closed_range() {
        let f = feature("CA1", "A", "2020-07-01", 10.0, -120.0, 38.0);
        let ig = crate::dates::date_to_unix("2020-07-01").unwrap();

        assert!(Filter::range_contains("Ig_Date", ig, ig).matches(&f));
        assert!(Filter::range_contains("Ig_Date", ig - 1, ig + 1).matches(&f));
        assert!(!Filter::range_contains("Ig_Date", ig + 1, ig + 2).matches(&f));
        assert!(!Filter::range_contains("Missing", 0, i64::MAX).matches(&f));
    }

    #[test]
    fn should_match_bounds_by_geometry() {
        let f = feature("CA1", "A", "2020-07-01", 10.0, -120.0, 38.0);

        let inside = BoundingBox::new(-121.0, 37.0, -119.0, 39.0).unwrap();
        let overlapping = BoundingBox::new(-119.95, 38.05, -119.0, 39.0).unwrap();
        let outside = BoundingBox::new(-100.0, 30.0, -90.0, 35.0).unwrap();

        assert!(Filter::Bounds(inside).matches(&f));
        assert!(Filter::Bounds(overlapping).matches(&f));
        assert!(!Filter::Bounds(outside).matches(&f));
        assert!(!Filter::Bounds(inside).matches(&Feature::default()));
    }

    #[test]
    fn should_combine_with_or_and_and() {
        let f = feature("CA1", "DIXIE", "2021-07-13", 10.0, -121.0, 40.0);

        let by_name = Filter::equals("Incid_Name", "DIXIE");
        let by_other = Filter::equals("Incid_Name", "CALDOR");
        let by_acres = Filter::equals("BurnBndAc", 10);

        assert!(Filter::Or(vec![by_other.clone(), by_name.clone()]).matches(&f));
        assert!(!Filter::And(vec![by_other, by_name.clone()]).matches(&f));
        assert!(Filter::And(vec![by_name, by_acres]).matches(&f));
    }

    #[test]
    fn should_encode_range_expression() {
        let expr = Filter::range_contains("Ig_Date", 0, 1000).to_expression();
        let invocation = &expr["functionInvocationValue"];

        assert_eq!(invocation["functionName"], "Filter.rangeContains");
        assert_eq!(invocation["arguments"]["field"]["constantValue"], "Ig_Date");
        assert_eq!(invocation["arguments"]["maxValue"]["constantValue"], 1000.0);
    }

    #[test]
    fn should_encode_bounds_as_polygon() {
        let bbox = BoundingBox::new(-1.0, -2.0, 3.0, 4.0).unwrap();
        let expr = Filter::Bounds(bbox).to_expression();
        let geometry = &expr["functionInvocationValue"]["arguments"]["rightValue"];

        assert_eq!(
            geometry["functionInvocationValue"]["functionName"],
            "GeometryConstructors.Polygon"
        );
        let ring = &geometry["functionInvocationValue"]["arguments"]["coordinates"]["constantValue"][0];
        assert_eq!(ring.as_array().unwrap().len(), 5);
        assert_eq!(ring[2], json!([3.0, 4.0]));
    }

    #[test]
    fn should_encode_or_as_filter_array() {
        let expr = Filter::Or(vec![
            Filter::equals("Incid_Name", "DIXIE"),
            Filter::equals("Ig_Date", 1626134400000_i64),
        ])
        .to_expression();
        let values = &expr["functionInvocationValue"]["arguments"]["filters"]["arrayValue"]["values"];

        assert_eq!(expr["functionInvocationValue"]["functionName"], "Filter.or");
        assert_eq!(values.as_array().unwrap().len(), 2);
        assert_eq!(
            values[1]["functionInvocationValue"]["functionName"],
            "Filter.equals"
        );
    }
}
