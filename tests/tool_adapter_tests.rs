use finagent::tool_protocol::{adapt, DeclaredTool, SchemaAdaptationError, ToolDescriptor};
use serde_json::json;

#[test]
fn test_adapt_preserves_name_and_description_verbatim() {
    let descriptor = ToolDescriptor {
        name: "get_gross_margins".to_string(),
        description: "Returns the gross margins for a given stock ticker.".to_string(),
        input_schema: Some(json!({ "type": "object", "properties": {} })),
    };

    let declared = adapt(&descriptor).unwrap();
    assert_eq!(declared.name, "get_gross_margins");
    assert_eq!(
        declared.description,
        "Returns the gross margins for a given stock ticker."
    );
}

#[test]
fn test_adapt_strips_only_the_protocol_keys() {
    let descriptor = ToolDescriptor {
        name: "screen_stocks".to_string(),
        description: "Screen a list of tickers.".to_string(),
        input_schema: Some(json!({
            "type": "object",
            "required": ["tickers"],
            "properties": {
                "tickers": { "type": "array", "items": { "type": "string" } }
            },
            "additionalProperties": false,
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "screen_stocksArguments"
        })),
    };

    let declared = adapt(&descriptor).unwrap();

    // The two wire-protocol keys are gone; everything else survives in its
    // catalog order.
    let keys: Vec<&str> = declared.parameters.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["type", "required", "properties", "title"]);

    assert_eq!(declared.parameters["type"], json!("object"));
    assert_eq!(declared.parameters["required"], json!(["tickers"]));
    assert_eq!(
        declared.parameters["properties"],
        json!({ "tickers": { "type": "array", "items": { "type": "string" } } })
    );
}

#[test]
fn test_adapt_passes_nested_schemas_through_untouched() {
    // Nested occurrences of the protocol keys are part of the tool's own
    // schema vocabulary; only top-level keys are removed.
    let descriptor = ToolDescriptor {
        name: "get_ticker_financials".to_string(),
        description: "Financial statement data.".to_string(),
        input_schema: Some(json!({
            "type": "object",
            "properties": {
                "filters": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                }
            },
            "additionalProperties": false
        })),
    };

    let declared = adapt(&descriptor).unwrap();
    assert!(!declared.parameters.contains_key("additionalProperties"));
    assert_eq!(
        declared.parameters["properties"]["filters"]["additionalProperties"],
        json!({ "type": "string" })
    );
}

#[test]
fn test_missing_schema_is_an_error() {
    let descriptor = ToolDescriptor {
        name: "get_market_cap".to_string(),
        description: "Market capitalisation.".to_string(),
        input_schema: None,
    };

    let err = adapt(&descriptor).unwrap_err();
    assert_eq!(
        err,
        SchemaAdaptationError::MissingSchema {
            tool: "get_market_cap".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "tool 'get_market_cap': descriptor has no input schema"
    );
}

#[test]
fn test_non_object_schema_is_an_error() {
    let descriptor = ToolDescriptor {
        name: "get_stock_info".to_string(),
        description: "General stock info.".to_string(),
        input_schema: Some(json!(["not", "a", "mapping"])),
    };

    let err = adapt(&descriptor).unwrap_err();
    assert_eq!(
        err,
        SchemaAdaptationError::NotAMapping {
            tool: "get_stock_info".to_string()
        }
    );
}

#[test]
fn test_empty_object_schema_adapts_to_empty_parameters() {
    let descriptor = ToolDescriptor {
        name: "list_supported_tickers".to_string(),
        description: "All tickers the service knows about.".to_string(),
        input_schema: Some(json!({})),
    };

    let declared = adapt(&descriptor).unwrap();
    assert!(declared.parameters.is_empty());
}

#[test]
fn test_handwritten_declaration_round_trips_through_serialization() {
    let mut parameters = serde_json::Map::new();
    parameters.insert("type".to_string(), json!("object"));
    parameters.insert(
        "properties".to_string(),
        json!({ "ticker": { "type": "string" } }),
    );

    let declared = DeclaredTool::new("echo", "Echo a ticker back").with_parameters(parameters);

    let encoded = serde_json::to_value(&declared).unwrap();
    assert_eq!(
        encoded,
        json!({
            "name": "echo",
            "description": "Echo a ticker back",
            "parameters": {
                "type": "object",
                "properties": { "ticker": { "type": "string" } }
            }
        })
    );
}
