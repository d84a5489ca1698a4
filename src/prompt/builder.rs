// file: src/prompt/builder.rs
// description: deterministic instruction builder for xml book lists
// reference: chat-style system/user prompting

use crate::config::SchemaConfig;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Both messages as one string, for backends that take a single prompt.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    schema: SchemaConfig,
    topic: String,
    count: Option<usize>,
}

impl PromptBuilder {
    pub fn new(schema: SchemaConfig, topic: impl Into<String>) -> Self {
        Self {
            schema,
            topic: topic.into(),
            count: None,
        }
    }

    pub fn with_count(mut self, count: Option<usize>) -> Self {
        self.count = count;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn build(&self) -> Prompt {
        let root = &self.schema.root_tag;
        let record = &self.schema.record_tag;
        let fields = self.schema.fields.join(", ");

        let amount = match self.count {
            Some(1) => "exactly 1 book".to_string(),
            Some(n) => format!("exactly {} books", n),
            None => "a list of books".to_string(),
        };

        let example_fields: String = self
            .schema
            .fields
            .iter()
            .map(|field| format!("    <{field}>...</{field}>\n"))
            .collect();

        let system = format!(
            concat!(
                "Generate an XML document that represents {amount}.\n",
                "Each book should contain the following elements: {fields}.\n",
                "The root element should be <{root}>, and each book should be nested within a <{record}> tag.\n",
                "Ensure proper XML formatting and structure.\n",
                "Respond with the XML document only, for example:\n",
                "<{root}>\n  <{record}>\n{example}  </{record}>\n</{root}>"
            ),
            amount = amount,
            fields = fields,
            root = root,
            record = record,
            example = example_fields,
        );

        let user = match self.count {
            Some(n) => format!("{} ({} books)", self.topic, n),
            None => self.topic.clone(),
        };

        Prompt { system, user }
    }
}
