//! User-facing reply text and LLM prompts.

use nimbus_mcp::ToolRegistry;

use crate::cities::City;
use crate::router::StateCode;

/// Shown for an alerts request without a state code.
pub const MISSING_STATE_CODE: &str =
    "❌ For weather alerts, please provide a US state code (e.g., 'alerts CA')";

/// Shown when no supported city is mentioned.
pub const CITY_NOT_FOUND: &str = "❌ City not found. Available US cities:

🇺🇸 Major Cities:
New York, Los Angeles, Chicago, Houston, Phoenix, Philadelphia

🇺🇸 West Coast:
San Francisco, Seattle, Portland, Las Vegas, Denver, Sacramento

🇺🇸 South:
Austin, Jacksonville, Charlotte, Fort Worth, El Paso, Memphis, Nashville, Atlanta, Miami

🇺🇸 Midwest/Northeast:
Detroit, Columbus, Milwaukee, Kansas City, Omaha, Boston, Baltimore, Washington

🇺🇸 Southwest:
Albuquerque, Tucson, Colorado Springs, Oklahoma City, Mesa, Virginia Beach

Usage examples:
- \"New York\" or \"Seattle\"
- \"alerts CA\" (for weather alerts)

Note: Only US cities are supported for accurate weather data.";

/// Used when the LLM cannot answer a question that named no city.
pub const VAGUE_QUESTION: &str = "I understand you're asking about weather. Could you be more specific about which US city or state you're interested in?";

/// Used when the model returns neither text nor a function call.
pub const NO_RESPONSE: &str = "I'm sorry, I couldn't generate a response.";

/// System instruction for function-calling requests.
pub const SYSTEM_PROMPT: &str = "You are a helpful weather assistant with access to real-time weather data for US cities.

You can:
- Get weather forecasts for any US city using coordinates
- Check weather alerts for US states
- Provide weather advice and recommendations
- Answer weather-related questions in a friendly, conversational manner

Available US cities include major cities like New York, Los Angeles, Chicago, Houston, etc.
For weather alerts, use 2-letter US state codes (CA, NY, TX, etc.).

Be conversational and helpful. If someone asks about weather, use the appropriate tools to get current data.";

/// Forecast text as returned without LLM phrasing.
pub fn forecast(city: &City, text: &str) -> String {
    format!("🌤️ Weather forecast for {}:\n\n{}", city.display_name(), text)
}

/// Forecast text used when LLM phrasing fails.
pub fn forecast_fallback(city: &City, text: &str) -> String {
    format!("🌤️ Here's the weather for {}:\n\n{}", city.display_name(), text)
}

/// Alerts text for a state.
pub fn alerts(state: &StateCode, text: &str) -> String {
    format!("🚨 Weather alerts for {state}:\n\n{text}")
}

/// A failed tool call.
pub fn service_error(message: &str) -> String {
    format!("❌ Weather service error: {message}")
}

/// Prompt asking the LLM to answer a question from forecast data.
pub fn forecast_prompt(question: &str, city: &City, data: &str) -> String {
    format!(
        "You are a helpful and friendly weather assistant. A user asked: \"{question}\"

I have retrieved the current weather forecast for {city}:

{data}

Please provide a helpful, conversational response that directly answers their question using this weather information.

Guidelines:
- Be conversational and friendly
- Give practical advice based on the weather data
- If they ask about umbrellas/rain, focus on precipitation chances
- If they ask about what to wear, consider temperature and conditions
- If they ask about outdoor activities, consider all relevant weather factors
- Keep it concise but informative
- Use emojis appropriately to make it engaging

Answer their specific question, don't just repeat the weather data.",
        city = city.display_name(),
    )
}

/// Prompt for a weather question that named no supported city.
pub fn vague_question_prompt(question: &str) -> String {
    format!(
        "You are a helpful weather assistant. The user asked: \"{question}\"

Provide a helpful response about weather. If they're asking about a specific location,
suggest they be more specific about US cities or states. Keep it friendly and conversational."
    )
}

/// The `/help` text for the interactive shell.
pub fn help(tools: &ToolRegistry) -> String {
    format!(
        "Commands:
  /help  - Show this help
  /tools - List available weather tools
  /quit  - Exit the client (also /q, /exit)

Available weather tools: {}

Examples:
- \"New York\" or \"Seattle\"
- \"alerts CA\" (US weather alerts)

Supported locations:
🇺🇸 US Cities only: Real weather data from National Weather Service

Type any invalid city name to see full US city list.",
        tools.names().join(", ")
    )
}

/// One `- name: description` line per tool.
pub fn tool_list(tools: &ToolRegistry) -> String {
    tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities;
    use nimbus_mcp::ToolDescriptor;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::from_descriptors(vec![
            ToolDescriptor {
                name: "get_alerts".to_string(),
                description: "Get weather alerts for a US state.".to_string(),
                input_schema: json!({}),
            },
            ToolDescriptor {
                name: "get_forecast".to_string(),
                description: "Get weather forecast for a location.".to_string(),
                input_schema: json!({}),
            },
        ])
    }

    #[test]
    fn test_forecast_formats() {
        let city = cities::by_name("new york").unwrap();
        assert_eq!(
            forecast(city, "Sunny"),
            "🌤️ Weather forecast for New York:\n\nSunny"
        );
        assert_eq!(
            forecast_fallback(city, "Sunny"),
            "🌤️ Here's the weather for New York:\n\nSunny"
        );
    }

    #[test]
    fn test_alerts_and_errors() {
        let state = StateCode::parse("ca").unwrap();
        assert_eq!(
            alerts(&state, "No active alerts"),
            "🚨 Weather alerts for CA:\n\nNo active alerts"
        );
        assert_eq!(
            service_error("NWS API unavailable"),
            "❌ Weather service error: NWS API unavailable"
        );
    }

    #[test]
    fn test_forecast_prompt_mentions_question_and_data() {
        let city = cities::by_name("seattle").unwrap();
        let prompt = forecast_prompt("Do I need an umbrella?", city, "Rain likely");
        assert!(prompt.contains("A user asked: \"Do I need an umbrella?\""));
        assert!(prompt.contains("forecast for Seattle:"));
        assert!(prompt.contains("Rain likely"));
    }

    #[test]
    fn test_help_lists_tools() {
        let text = help(&registry());
        assert!(text.contains("Available weather tools: get_alerts, get_forecast"));
        assert!(text.contains("/quit"));
    }

    #[test]
    fn test_tool_list() {
        assert_eq!(
            tool_list(&registry()),
            "- get_alerts: Get weather alerts for a US state.\n\
             - get_forecast: Get weather forecast for a location."
        );
        assert_eq!(tool_list(&ToolRegistry::default()), "");
    }
}
