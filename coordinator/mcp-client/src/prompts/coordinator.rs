/// Routing and tool-use prompts

use crate::agents::DomainAgent;
use crate::shared::ToolDefinition;

/// System prompt for the routing call.
pub fn routing_system_prompt(agents: &[DomainAgent], active_agent: Option<&str>) -> String {
    let roster = agents
        .iter()
        .map(|agent| format!("- {}: {}", agent.name, agent.description))
        .collect::<Vec<_>>()
        .join("\n");

    let active = match active_agent {
        Some(name) => format!(
            "\n\nThe conversation is currently handled by {}. Keep routing follow-up messages \
             (answers to its questions, refinements, confirmations) to it unless the user \
             clearly changes topic.",
            name
        ),
        None => String::new(),
    };

    format!(
        r#"You are the Travel Coordinator, the first point of contact for a travel assistant.
Your only job is to decide which specialist agent should handle the user's latest message.

Available agents:
{}

Respond with a JSON object in this exact format:
{{
  "agent": "<agent name from the list, or null>",
  "reply": "short message for the user"
}}

Rules:
- Pick exactly one agent when the request concerns its domain.
- Creating, listing or cancelling reservations goes to booking_management_agent.
- Use "agent": null for greetings, small talk or requests outside travel, and answer them
  yourself in "reply", explaining what kinds of travel requests you can help with.{}"#,
        roster, active
    )
}

/// System prompt for one domain agent step, listing its tools.
pub fn agent_system_prompt(agent: &DomainAgent, tools: &[ToolDefinition]) -> String {
    let tool_list = if tools.is_empty() {
        "(no tools are currently available; explain the limitation to the user)".to_string()
    } else {
        tools
            .iter()
            .map(|tool| {
                let params = tool
                    .parameters
                    .iter()
                    .map(|p| format!("{} ({}): {}", p.name, p.kind, p.description))
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("- {}: {}\n  parameters: {}", tool.name, tool.description, params)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"{}

{}

You have access to these tools:
{}

Respond with a JSON object in this exact format:
{{
  "reasoning": "explanation of what you're doing",
  "tool_calls": [
    {{"name": "tool_name", "arguments": {{"param1": "value1"}}}}
  ],
  "user_message": "message for the user"
}}

IMPORTANT:
- Leave "tool_calls" empty once you have what you need; "user_message" is then your final answer.
- Tool results come back in the next user message prefixed with TOOL RESULTS.
- If a tool fails, explain the limitation to the user instead of retrying forever.
- Only use tools from the list above."#,
        agent.description, agent.instruction, tool_list
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{HOTELS_AGENT, ROSTER};
    use crate::shared::ToolParameter;

    #[test]
    fn test_routing_prompt_lists_agents_and_active_agent() {
        let prompt = routing_system_prompt(&ROSTER, Some("flights_agent"));
        for agent in &ROSTER {
            assert!(prompt.contains(agent.name));
        }
        assert!(prompt.contains("currently handled by flights_agent"));
        assert!(!routing_system_prompt(&ROSTER, None).contains("currently handled"));
    }

    #[test]
    fn test_agent_prompt_lists_tools() {
        let tools = vec![ToolDefinition {
            name: "search-hotels-by-location".to_string(),
            description: "Search hotels in a city".to_string(),
            parameters: vec![ToolParameter {
                name: "location".to_string(),
                kind: "string".to_string(),
                description: "City name".to_string(),
            }],
        }];
        let prompt = agent_system_prompt(&HOTELS_AGENT, &tools);
        assert!(prompt.contains("- search-hotels-by-location: Search hotels in a city"));
        assert!(prompt.contains("location (string): City name"));
        assert!(prompt.contains("As the dedicated Hotels Agent"));
    }
}
