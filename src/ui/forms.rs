use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Student, LEVEL_MAX, LEVEL_MIN};

/// Minimum password length accepted by the signup flow.
pub(crate) const MIN_PASSWORD_LEN: usize = 4;
/// Minimum length of a student number.
pub(crate) const MIN_STUDENT_NUMBER_LEN: usize = 5;

/// Fields available within the login form.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum LoginField {
    #[default]
    Username,
    Password,
}

/// Username/password inputs shared by the log in and sign up actions.
#[derive(Default, Clone)]
pub(crate) struct LoginForm {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) active: LoginField,
    pub(crate) show_password: bool,
    pub(crate) error: Option<String>,
}

impl LoginForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            LoginField::Username => self.username.push(ch),
            LoginField::Password => self.password.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoginField::Username => {
                self.username.pop();
            }
            LoginField::Password => {
                self.password.pop();
            }
        }
    }

    /// Wipe both inputs and return focus to the username.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn clear_password(&mut self) {
        self.password.clear();
        self.active = LoginField::Password;
    }

    pub(crate) fn toggle_password_visibility(&mut self) -> bool {
        self.show_password = !self.show_password;
        self.show_password
    }

    /// Trimmed username plus the password exactly as typed.
    pub(crate) fn parse_login(&self) -> Result<(String, String)> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(anyhow!("Please enter both username and password."));
        }
        Ok((username.to_string(), self.password.clone()))
    }

    /// Same as [`parse_login`](Self::parse_login) plus the password length rule.
    pub(crate) fn parse_signup(&self) -> Result<(String, String)> {
        let (username, password) = self.parse_login()?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(anyhow!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            ));
        }
        Ok((username, password))
    }

    pub(crate) fn masked_password(&self) -> String {
        if self.show_password {
            self.password.clone()
        } else {
            "*".repeat(self.password.chars().count())
        }
    }

    pub(crate) fn build_line(&self, field_name: &str, field: LoginField) -> Line<'static> {
        let value = match field {
            LoginField::Username => self.username.clone(),
            LoginField::Password => self.masked_password(),
        };
        let style = if self.active == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(value, style),
        ])
    }

    pub(crate) fn value_len(&self, field: LoginField) -> usize {
        match field {
            LoginField::Username => self.username.chars().count(),
            LoginField::Password => self.password.chars().count(),
        }
    }
}

/// Fields available within the student form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum StudentField {
    #[default]
    StudentNumber,
    FirstName,
    LastName,
    Program,
    Level,
}

impl StudentField {
    pub(crate) const ALL: [StudentField; 5] = [
        StudentField::StudentNumber,
        StudentField::FirstName,
        StudentField::LastName,
        StudentField::Program,
        StudentField::Level,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            StudentField::StudentNumber => "Student Number",
            StudentField::FirstName => "First Name",
            StudentField::LastName => "Last Name",
            StudentField::Program => "Program",
            StudentField::Level => "Level",
        }
    }

    /// Identity fields cannot change once a record exists.
    fn is_identity(self) -> bool {
        matches!(
            self,
            StudentField::StudentNumber | StudentField::FirstName | StudentField::LastName
        )
    }

    fn index(self) -> usize {
        StudentField::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }
}

/// Internal representation of the add/edit student form.
#[derive(Clone)]
pub(crate) struct StudentForm {
    pub(crate) student_number: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) program: String,
    pub(crate) level: i64,
    pub(crate) active: StudentField,
    /// Set when editing: student number and names are read-only.
    pub(crate) locked: bool,
    pub(crate) error: Option<String>,
}

impl Default for StudentForm {
    fn default() -> Self {
        Self {
            student_number: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            program: String::new(),
            level: LEVEL_MIN,
            active: StudentField::StudentNumber,
            locked: false,
            error: None,
        }
    }
}

impl StudentForm {
    /// Populate the form from an existing record; focus lands on the first
    /// editable field.
    pub(crate) fn from_student(student: &Student) -> Self {
        Self {
            student_number: student.student_number.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            program: student.program.clone(),
            level: student.level.clamp(LEVEL_MIN, LEVEL_MAX),
            active: StudentField::Program,
            locked: true,
            error: None,
        }
    }

    pub(crate) fn is_editable(&self, field: StudentField) -> bool {
        !(self.locked && field.is_identity())
    }

    /// Advance focus, skipping locked fields.
    pub(crate) fn next_field(&mut self) {
        self.step_field(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.step_field(StudentField::ALL.len() - 1);
    }

    fn step_field(&mut self, step: usize) {
        let len = StudentField::ALL.len();
        let mut idx = self.active.index();
        for _ in 0..len {
            idx = (idx + step) % len;
            let candidate = StudentField::ALL[idx];
            if self.is_editable(candidate) {
                self.active = candidate;
                return;
            }
        }
    }

    /// Append a character to the active text field. On the level field `+`
    /// and `-` move the spinner instead.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            StudentField::Level => match ch {
                '+' => self.increment_level(),
                '-' => self.decrement_level(),
                _ => false,
            },
            field => match self.text_mut(field) {
                Some(value) => {
                    value.push(ch);
                    true
                }
                None => false,
            },
        }
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        if let Some(value) = self.text_mut(field) {
            value.pop();
        }
    }

    pub(crate) fn increment_level(&mut self) -> bool {
        if self.level < LEVEL_MAX {
            self.level += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn decrement_level(&mut self) -> bool {
        if self.level > LEVEL_MIN {
            self.level -= 1;
            true
        } else {
            false
        }
    }

    /// Reset the inputs to a blank new-record form.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    fn text_mut(&mut self, field: StudentField) -> Option<&mut String> {
        if !self.is_editable(field) {
            return None;
        }
        match field {
            StudentField::StudentNumber => Some(&mut self.student_number),
            StudentField::FirstName => Some(&mut self.first_name),
            StudentField::LastName => Some(&mut self.last_name),
            StudentField::Program => Some(&mut self.program),
            StudentField::Level => None,
        }
    }

    fn display_value(&self, field: StudentField) -> String {
        match field {
            StudentField::StudentNumber => self.student_number.clone(),
            StudentField::FirstName => self.first_name.clone(),
            StudentField::LastName => self.last_name.clone(),
            StudentField::Program => self.program.clone(),
            StudentField::Level => format!("< {} >", self.level),
        }
    }

    /// Validate the inputs and return an unsaved record with trimmed fields.
    pub(crate) fn parse_inputs(&self) -> Result<Student> {
        let student_number = self.student_number.trim();
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        let program = self.program.trim();

        if student_number.is_empty()
            || first_name.is_empty()
            || last_name.is_empty()
            || program.is_empty()
        {
            return Err(anyhow!("Please fill in all required fields."));
        }
        if student_number.chars().count() < MIN_STUDENT_NUMBER_LEN {
            return Err(anyhow!(
                "Student number must be at least {MIN_STUDENT_NUMBER_LEN} characters."
            ));
        }
        if !(LEVEL_MIN..=LEVEL_MAX).contains(&self.level) {
            return Err(anyhow!(
                "Level must be between {LEVEL_MIN} and {LEVEL_MAX}."
            ));
        }

        Ok(Student::new(
            student_number,
            first_name,
            last_name,
            program,
            self.level,
        ))
    }

    /// Validate an edit of `original`. Only program and level may change;
    /// names are compared ignoring case.
    pub(crate) fn parse_update(&self, original: &Student) -> Result<Student> {
        let mut student = self.parse_inputs()?;
        let identity_changed = student.student_number != original.student_number
            || !same_ignoring_case(&student.first_name, &original.first_name)
            || !same_ignoring_case(&student.last_name, &original.last_name);
        if identity_changed {
            return Err(anyhow!("You can only update the program and grade level."));
        }
        student.id = original.id;
        Ok(student)
    }

    pub(crate) fn build_line(&self, field: StudentField) -> Line<'static> {
        let value = self.display_value(field);
        let editable = self.is_editable(field);
        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value
        };

        let style = if self.active == field {
            Style::default().fg(Color::Yellow)
        } else if !editable || display == "<required>" {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ];
        if !editable {
            spans.push(Span::styled(
                " (locked)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }

    pub(crate) fn value_len(&self, field: StudentField) -> usize {
        self.display_value(field).chars().count()
    }
}

fn same_ignoring_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[derive(Clone)]
pub(crate) struct ConfirmStudentDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl ConfirmStudentDelete {
    pub(crate) fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            name: student.full_name(),
        }
    }
}
