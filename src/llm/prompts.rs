// Persona instructions and voice reply templates

use crate::router::Persona;

const VOICE_STYLE: &str = "Keep your responses concise and natural, without complex formatting or emojis. \
Use contractions and casual language. Be warm and personable, like talking to a friend.";

const BARISTA_MENU: &str = "Available drinks: Latte, Cappuccino, Espresso, Americano, Mocha, Macchiato, Flat White
Sizes: Small, Medium, Large
Milk: Whole, Skim, Oat, Almond, Soy, Coconut, No milk
Extras: Whipped cream, Extra shot, Vanilla/Caramel/Hazelnut syrup, Sugar, Honey";

pub struct SystemPrompts;

impl SystemPrompts {
    /// Instructions for a persona.
    ///
    /// `history_context` is the wellness history summary; it is spliced into
    /// the prompts of personas that may run a check-in.
    pub fn for_persona(persona: Persona, history_context: Option<&str>) -> String {
        match persona {
            Persona::Chat => PromptBuilder::new()
                .add_system_role(Self::chat())
                .add_constraint(VOICE_STYLE)
                .build(),
            Persona::Barista => PromptBuilder::new()
                .add_system_role(Self::barista())
                .add_context(BARISTA_MENU)
                .add_constraint(VOICE_STYLE)
                .build(),
            Persona::WellnessCompanion => {
                let mut builder = PromptBuilder::new().add_system_role(Self::wellness_companion());
                if let Some(context) = history_context {
                    builder = builder.add_context(&format!("PREVIOUS CHECK-IN: {}", context));
                }
                builder
                    .add_constraint("Never provide medical advice or diagnose. Keep suggestions small and actionable.")
                    .add_constraint(VOICE_STYLE)
                    .build()
            }
            Persona::SalesRep => PromptBuilder::new()
                .add_system_role(Self::sales_rep())
                .add_constraint("Never invent pricing or commitments. Offer to have the team follow up instead.")
                .add_constraint(VOICE_STYLE)
                .build(),
            Persona::Receptionist => PromptBuilder::new()
                .add_system_role(Self::receptionist())
                .add_constraint(VOICE_STYLE)
                .build(),
        }
    }

    fn chat() -> &'static str {
        "You are Nero, a friendly and helpful AI assistant for general conversation.
You can answer questions on various topics, have casual conversations, provide information \
and explanations, tell jokes or stories, and discuss current events, technology and science."
    }

    fn barista() -> &'static str {
        "You are Nero, a friendly barista at a specialty coffee shop. The user is talking to you by voice to place an order.

Your job:
- Greet customers warmly and ask what they'd like to order
- Collect: drink type, size and their name; ask for milk preference
- Ask about optional extras (whipped cream, syrups, extra shots)
- Record each detail with update_order as soon as you hear it
- Confirm the complete order, then use complete_order to save it"
    }

    fn wellness_companion() -> &'static str {
        "You are Nero, a warm and supportive wellness companion conducting a daily check-in.

Your process:
1. Greet warmly and reference the previous check-in if available
2. Ask about mood and energy level (high, medium or low)
3. Gently inquire about stress factors
4. Help identify 1-3 practical daily objectives
5. Ask about self-care intentions
6. Offer simple, realistic advice
7. Provide a recap and confirm
8. Use complete_checkin to save"
    }

    fn sales_rep() -> &'static str {
        "You are Nero, a friendly sales development representative. The user is a prospect talking to you by voice.

Your job:
- Greet them and ask what brought them here today
- Answer questions briefly and note each one with update_lead (field questionsAsked)
- Naturally collect their name, company, email, role and what they want to use our services for
- Ask about team size and timeline if it comes up
- Record each detail with update_lead as soon as you hear it
- Recap what you captured, then use complete_lead to save it"
    }

    fn receptionist() -> &'static str {
        "You are Nero, a versatile AI assistant that can help with multiple services.
When a user first connects, greet them warmly and ask which service they need:
1. General Chat - a friendly conversation about anything
2. Coffee Ordering - place an order at our virtual coffee shop
3. Wellness Check-in - daily reflection on mood, energy and goals
4. Sales - talk to our sales team about what we can do for your business
Once they choose, use route_to_service to switch to that service."
    }
}

pub struct ConversationTemplates;

impl ConversationTemplates {
    /// Follow-up question when required fields are still missing
    pub fn incomplete(missing: &[&str]) -> String {
        match missing {
            [] => "I think I have everything I need.".to_string(),
            [only] => format!("I still need your {}.", only),
            [init @ .., last] => format!("I still need your {} and {}.", init.join(", "), last),
        }
    }

    /// Ask again after values were refused; `reasons` come from the accumulator
    pub fn rejected(reasons: &[String]) -> String {
        match reasons {
            [] => "Sorry, I didn't catch that. Could you say it again?".to_string(),
            [only] => format!("Sorry, {}. Could you tell me again?", only),
            _ => format!(
                "Sorry, a couple of things didn't work: {}. Could you tell me again?",
                reasons.join("; ")
            ),
        }
    }

    pub fn order_saved(summary: &str) -> String {
        format!(
            "Your order is in: {}. Thank you and have a great day!",
            summary
        )
    }

    pub fn lead_saved(summary: &str) -> String {
        format!(
            "Thanks! I've noted: {}. Someone from our team will reach out within 24 hours.",
            summary
        )
    }

    pub fn checkin_saved(summary: &str) -> String {
        format!(
            "Check-in saved! Here's what I recorded: {}. Remember, small steps lead to big changes.",
            summary
        )
    }

    /// Apology when a record could not be written
    pub fn save_failed(what: &str) -> String {
        format!(
            "I'm sorry, I couldn't save your {} just now. Let's try that again in a moment.",
            what
        )
    }

    pub fn unknown_service(tags: &[String]) -> String {
        format!(
            "I'm sorry, that's not a service I offer. Please choose one of: {}.",
            tags.join(", ")
        )
    }

    pub fn service_selected(persona: Persona) -> String {
        match persona {
            Persona::Barista => {
                "Great, let's get you a coffee! What can I get started for you today?".to_string()
            }
            Persona::WellnessCompanion => {
                "Let's do your check-in. How are you feeling today?".to_string()
            }
            Persona::Chat => "Sure, let's chat! What's on your mind?".to_string(),
            Persona::SalesRep => {
                "Happy to help! Could you tell me a bit about yourself and your company?".to_string()
            }
            Persona::Receptionist => {
                "I can help with general chat, coffee ordering, a wellness check-in or sales. Which would you like?"
                    .to_string()
            }
        }
    }

    pub fn goodbye() -> &'static str {
        "Goodbye! Feel free to come back anytime."
    }
}

pub struct PromptBuilder {
    parts: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn add_system_role(mut self, prompt: &str) -> Self {
        self.parts.push(format!("System: {}", prompt));
        self
    }

    pub fn add_context(mut self, context: &str) -> Self {
        self.parts.push(format!("Context: {}", context));
        self
    }

    pub fn add_constraint(mut self, constraint: &str) -> Self {
        self.parts.push(format!("Constraint: {}", constraint));
        self
    }

    pub fn build(self) -> String {
        self.parts.join("\n\n")
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
