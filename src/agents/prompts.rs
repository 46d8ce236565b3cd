// Prompt templates for LLM interactions
//
// Templates use `{{name}}` placeholders. Prompts are versioned so a change
// in wording shows up in the logs next to the answers it produced.

/// Prompt template structure
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub name: String,
    pub version: String,
    pub user_template: String,
}

impl PromptTemplate {
    /// Render the user template, replacing every `{{key}}` with its value
    ///
    /// The template is scanned once, so placeholders inside substituted values
    /// are not expanded. Placeholders without a value are left as they are.
    ///
    /// # Example
    /// ```
    /// use agent_swarm::agents::prompts::PromptTemplate;
    ///
    /// let template = PromptTemplate {
    ///     name: "greeting".to_string(),
    ///     version: "1.0.0".to_string(),
    ///     user_template: "Hello {{who}}!".to_string(),
    /// };
    /// assert_eq!(template.render(&[("who", "canvas")]), "Hello canvas!");
    /// ```
    pub fn render(&self, variables: &[(&str, &str)]) -> String {
        let mut rendered = String::with_capacity(self.user_template.len());
        let mut rest = self.user_template.as_str();

        while let Some(open) = rest.find("{{") {
            rendered.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];

            let substitution = after_open.find("}}").and_then(|close| {
                let key = &after_open[..close];
                variables
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (*value, &after_open[close + 2..]))
            });

            match substitution {
                Some((value, remainder)) => {
                    rendered.push_str(value);
                    rest = remainder;
                }
                None => {
                    rendered.push_str("{{");
                    rest = after_open;
                }
            }
        }

        rendered.push_str(rest);
        rendered
    }
}

pub mod library {
    use super::PromptTemplate;

    pub fn expert_routing() -> PromptTemplate {
        PromptTemplate {
            name: "expert_routing".to_string(),
            version: "1.1.0".to_string(),
            user_template: "User goal: \"{{goal}}\". Which expert is best for this task? \
                            Your answer MUST be a single word from this list: [{{experts}}]"
                .to_string(),
        }
    }

    pub fn canvas_plan() -> PromptTemplate {
        PromptTemplate {
            name: "canvas_plan".to_string(),
            version: "1.0.0".to_string(),
            user_template: "You control an HTML-style 2D canvas through JSON commands.\n\
                            Goal: {{goal}}\n\n\
                            Answer with a JSON array inside a ```json code block. Each element is\n\
                            {\"action\": <verb>, \"params\": {...}}. Available verbs:\n\
                            - set_fill_style {color}\n\
                            - set_stroke_style {color, lineWidth}\n\
                            - set_font {font}\n\
                            - clear_rect {x, y, width, height}\n\
                            - fill_rect {x, y, width, height, color?}\n\
                            - stroke_rect {x, y, width, height, color?, lineWidth?}\n\
                            - fill_text {text, x, y, color?, font?}\n\
                            - draw_path {fillStyle?, strokeStyle?, lineWidth?, path: [{type, args}]}\n\
                              where type is begin_path, move_to, line_to, arc, rect or close_path\n\
                            - set_linear_gradient_fill {x0, y0, x1, y1, colorStops: [{offset, color}]}\n\
                            - set_radial_gradient_fill {x0, y0, r0, x1, y1, r1, colorStops}\n\
                            - put_image_data {data, width, height, x?, y?}\n\
                            - reset_canvas {}\n\
                            Commands run in order; styles persist between commands."
                .to_string(),
        }
    }

    pub fn scene_plan() -> PromptTemplate {
        PromptTemplate {
            name: "scene_plan".to_string(),
            version: "1.0.0".to_string(),
            user_template: "You build a 3D scene through JSON commands.\n\
                            Goal: {{goal}}\n\n\
                            {{guidance}}\n\n\
                            Answer with a JSON array inside a ```json code block. Each element is\n\
                            {\"action\": <verb>, \"params\": {...}}."
                .to_string(),
        }
    }

    pub const SCENE_GUIDANCE: &str = "Verbs:\n\
        - clear_scene {}\n\
        - create_mesh {id, geometry: BoxGeometry|SphereGeometry|PlaneGeometry,\n\
          material: MeshStandardMaterial|MeshBasicMaterial, materialParams, position: {x, y, z},\n\
          rotation: {x, y, z}}\n\
        - set_position {id, position: {x, y, z}}\n\
        - add_light {type: AmbientLight|DirectionalLight|PointLight, color, intensity,\n\
          position?, id?}\n\
        Give every object you may move later an id. Add at least one light when using\n\
        MeshStandardMaterial or nothing will be visible.";
}
