//! Prompt templates for the SQL, answer and report completions.
//!
//! Templates are Jinja2 (minijinja). Dialect rules, worked examples and
//! domain notes are data rendered into the SQL template; the templates
//! themselves hold no dialect knowledge.

use minijinja::{Environment, context};
use serde::Serialize;
use sqlchat_core::conversation::render_turns;
use sqlchat_core::{DialectProfile, Result, SqlChatError, Turn};

const SQL_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking questions about the company's database.
Based on the table schema below, write a query in {{ dialect.name }} that would answer the user's question. Take the conversation history into account.

<SCHEMA>{{ schema }}</SCHEMA>
{% if domain_notes %}
Domain notes:
{% for note in domain_notes -%}
{{ note }}
{% endfor %}{% endif %}
Conversation History:
{{ history }}

Guidelines:
1. Write only the SQL query and nothing else. Do not wrap the SQL query in any other text, comments, or backticks.
2. Write exactly one statement and do not end it with a semicolon.
3. Use table and column names exactly as they appear in the schema.
4. Optimize the query for performance where possible.
5. Only read data: never write INSERT, UPDATE, DELETE, MERGE or DDL statements.
6. Follow these {{ dialect.name }} rules, and use no functions outside them for date arithmetic or null handling:
{% for rule in dialect.rules -%}
- {{ rule }}
{% endfor %}
For example:
{% for example in dialect.examples -%}
Question: {{ example.question }}
SQL Query: {{ example.sql }}

{% endfor -%}
Your turn:
Question: {{ question }}
SQL Query:"#;

const RESPONSE_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.
Based on the table schema below, question, SQL query, and SQL response, write a clear natural language response.
If the SQL response reports a failure, say plainly that the query failed and explain the issue in natural language. Never invent results.

<SCHEMA>{{ schema }}</SCHEMA>

Conversation History:
{{ history }}
SQL Query: <SQL>{{ sql }}</SQL>
User Question: {{ question }}
SQL Response: {{ response }}"#;

const REPORT_TEMPLATE: &str = r#"You are a data analyst assistant. Based on the conversation history and the database queries in it, generate a detailed report summarizing:

1. Key findings based on the SQL queries executed.
2. Trends observed in the data.
3. Insights that could help the business or technical team make decisions.

Report Format (use these four headings, in this order):
{% for section in sections -%}
{{ loop.index }}. **{{ section.title }}**: {{ section.description }}
{% endfor %}
Conversation History:
{{ history }}"#;

/// One of the four headings a report must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: &'static str,
    pub description: &'static str,
}

pub const REPORT_SECTIONS: [ReportSection; 4] = [
    ReportSection {
        title: "Introduction",
        description: "A brief overview of the analysis.",
    },
    ReportSection {
        title: "Key Findings",
        description: "Summarize key findings from the data analysis.",
    },
    ReportSection {
        title: "Trends/Patterns",
        description: "Mention any trends or patterns identified in the data.",
    },
    ReportSection {
        title: "Recommendations",
        description: "Provide actionable recommendations for the business or technical team.",
    },
];

/// Report headings absent from `report` (case-insensitive).
pub fn missing_report_sections(report: &str) -> Vec<&'static str> {
    let lower = report.to_lowercase();
    REPORT_SECTIONS
        .iter()
        .map(|section| section.title)
        .filter(|title| !lower.contains(&title.to_lowercase()))
        .collect()
}

/// The three prompt contracts, bound to one dialect profile.
pub struct PromptTemplates {
    env: Environment<'static>,
    dialect: DialectProfile,
    domain_notes: Vec<String>,
}

impl PromptTemplates {
    pub fn new(dialect: DialectProfile, domain_notes: Vec<String>) -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("sql", SQL_TEMPLATE),
            ("response", RESPONSE_TEMPLATE),
            ("report", REPORT_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|e| SqlChatError::internal(format!("invalid {name} template: {e}")))?;
        }

        Ok(Self {
            env,
            dialect,
            domain_notes,
        })
    }

    pub fn dialect(&self) -> &DialectProfile {
        &self.dialect
    }

    /// Prompt for the query synthesizer.
    pub fn sql_prompt(&self, schema: &str, history: &[Turn], question: &str) -> Result<String> {
        self.render(
            "sql",
            context! {
                dialect => &self.dialect,
                domain_notes => &self.domain_notes,
                schema => schema,
                history => render_turns(history),
                question => question,
            },
        )
    }

    /// Prompt for the response synthesizer. `response` is the rendered rows or failure.
    pub fn response_prompt(
        &self,
        schema: &str,
        history: &[Turn],
        question: &str,
        sql: &str,
        response: &str,
    ) -> Result<String> {
        self.render(
            "response",
            context! {
                schema => schema,
                history => render_turns(history),
                sql => sql,
                question => question,
                response => response,
            },
        )
    }

    /// Prompt for the report variant, seeded with the conversation only.
    pub fn report_prompt(&self, history: &[Turn]) -> Result<String> {
        self.render(
            "report",
            context! {
                sections => REPORT_SECTIONS,
                history => render_turns(history),
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|e| SqlChatError::internal(format!("failed to render {name} prompt: {e}")))
    }
}
