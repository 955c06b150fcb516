//! Login / sign-up form. Presentation only: nothing is validated or sent.

use crate::input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Login,
    Signup,
}

impl FormMode {
    pub fn toggled(self) -> Self {
        match self {
            FormMode::Login => FormMode::Signup,
            FormMode::Signup => FormMode::Login,
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            FormMode::Login => "Login",
            FormMode::Signup => "Sign Up",
        }
    }

    pub fn button_label(self) -> &'static str {
        self.heading()
    }

    pub fn switch_prompt(self) -> &'static str {
        match self {
            FormMode::Login => "Don't have an account?",
            FormMode::Signup => "Already have an account?",
        }
    }

    /// Text of the link that switches to the other mode.
    pub fn toggle_label(self) -> &'static str {
        self.toggled().heading()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FullName,
    Email,
    Password,
    Submit,
    Toggle,
}

impl FormField {
    pub fn placeholder(self) -> &'static str {
        match self {
            FormField::FullName => "Full Name",
            FormField::Email => "Email",
            FormField::Password => "Password",
            FormField::Submit | FormField::Toggle => "",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, FormField::FullName | FormField::Email | FormField::Password)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub mode: FormMode,
    pub full_name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub focus: FormField,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            mode: FormMode::Login,
            full_name: TextInput::new(),
            email: TextInput::new(),
            password: TextInput::new(),
            focus: FormField::Email,
        }
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signup(&self) -> bool {
        self.mode == FormMode::Signup
    }

    /// Focusable elements in display order for the current mode.
    pub fn visible_fields(&self) -> Vec<FormField> {
        let mut fields = Vec::with_capacity(5);
        if self.is_signup() {
            fields.push(FormField::FullName);
        }
        fields.extend([
            FormField::Email,
            FormField::Password,
            FormField::Submit,
            FormField::Toggle,
        ]);
        fields
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        let visible = self.visible_fields();
        if !visible.contains(&self.focus) {
            self.focus = visible[0];
        }
    }

    pub fn focus_next(&mut self) {
        let visible = self.visible_fields();
        let i = visible.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = visible[(i + 1) % visible.len()];
    }

    pub fn focus_prev(&mut self) {
        let visible = self.visible_fields();
        let i = visible.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = visible[(i + visible.len() - 1) % visible.len()];
    }

    pub fn field(&self, field: FormField) -> Option<&TextInput> {
        match field {
            FormField::FullName => Some(&self.full_name),
            FormField::Email => Some(&self.email),
            FormField::Password => Some(&self.password),
            FormField::Submit | FormField::Toggle => None,
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            FormField::FullName => Some(&mut self.full_name),
            FormField::Email => Some(&mut self.email),
            FormField::Password => Some(&mut self.password),
            FormField::Submit | FormField::Toggle => None,
        }
    }

    /// Enter on the focused element. The submit button is inert.
    pub fn activate(&mut self) {
        match self.focus {
            FormField::Toggle => self.toggle_mode(),
            FormField::Submit => {
                tracing::debug!(mode = self.mode.heading(), "form submit has no handler");
            }
            _ => self.focus_next(),
        }
    }
}
