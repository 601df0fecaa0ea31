use std::mem;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::{error, info, warn};

use crate::db::{AdminAccountStore, StudentRecordStore};
use crate::error::{StoreError, WriteOutcome};
use crate::models::Student;

use super::forms::{ConfirmStudentDelete, LoginField, StudentField, StudentForm};
use super::helpers::{centered_rect, key_hints, surface_error, timestamp_label};
use super::screens::{LoginScreen, StudentScreen, MAX_LOGIN_ATTEMPTS};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp / PageDown in the student table.
const PAGE_STEP: isize = 10;
const APP_TITLE: &str = "Student Record Management System";
const LOCKED_MESSAGE: &str = "Maximum login attempts exceeded. Please restart the application.";

/// High-level navigation states.
enum Screen {
    Login(LoginScreen),
    Students(StudentScreen),
}

/// Fine-grained modes scoped to the current screen. On the login screen
/// `Normal` means typing into the credential form.
enum Mode {
    Normal,
    AddingStudent(StudentForm),
    EditingStudent { original: Student, form: StudentForm },
    ConfirmStudentDelete(ConfirmStudentDelete),
    ConfirmLogout,
    ConfirmLoginAfterSignup { username: String },
    Searching(String),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    admin_store: AdminAccountStore,
    student_store: StudentRecordStore,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(admin_store: AdminAccountStore, student_store: StudentRecordStore) -> Self {
        Self {
            admin_store,
            student_store,
            screen: Screen::Login(LoginScreen::default()),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Route a key press to the active mode. Returns `true` when the user
    /// asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingStudent(form) => self.handle_add_student(code, form)?,
            Mode::EditingStudent { original, form } => {
                self.handle_edit_student(code, original, form)?
            }
            Mode::ConfirmStudentDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ConfirmLogout => self.handle_confirm_logout(code)?,
            Mode::ConfirmLoginAfterSignup { username } => {
                self.handle_confirm_login_after_signup(code, username)?
            }
            Mode::Searching(query) => self.handle_search(code, query)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Dispatch one key press, including modifier chords. Returns `true` when
    /// the user asked to quit.
    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char(ch) = key.code {
                if ch == 'c' {
                    return Ok(true);
                }
                if self.handle_ctrl(ch)? {
                    return Ok(false);
                }
                // An unbound chord must not type its letter into a field.
                if self.is_typing() {
                    return Ok(false);
                }
            }
        }
        self.handle_key(key.code)
    }

    /// Whether plain characters currently go into a text field.
    fn is_typing(&self) -> bool {
        match self.mode {
            Mode::Normal => self.on_login_screen(),
            Mode::AddingStudent(_) | Mode::EditingStudent { .. } | Mode::Searching(_) => true,
            Mode::ConfirmStudentDelete(_)
            | Mode::ConfirmLogout
            | Mode::ConfirmLoginAfterSignup { .. } => false,
        }
    }

    /// Handle a Ctrl+<ch> chord. Returns `true` when the chord was consumed.
    pub(crate) fn handle_ctrl(&mut self, ch: char) -> Result<bool> {
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        let (mode, handled) = match (mode, ch) {
            (Mode::Normal, _) if self.on_login_screen() => self.handle_login_ctrl(ch),
            (Mode::AddingStudent(mut form), 'u') => {
                form.clear();
                self.set_status("Fields cleared - Ready for new entry.", StatusKind::Info);
                (Mode::AddingStudent(form), true)
            }
            (Mode::EditingStudent { original, .. }, 'u') => {
                let form = StudentForm::from_student(&original);
                self.set_status("Changes discarded.", StatusKind::Info);
                (Mode::EditingStudent { original, form }, true)
            }
            (mode, _) => (mode, false),
        };
        self.mode = mode;
        Ok(handled)
    }

    fn on_login_screen(&self) -> bool {
        matches!(self.screen, Screen::Login(_))
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if self.on_login_screen() {
            self.handle_login_key(code, exit)
        } else {
            self.handle_students_key(code, exit)
        }
    }

    fn handle_login_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if code == KeyCode::Enter {
            self.attempt_login();
            return Ok(Mode::Normal);
        }

        let Screen::Login(login) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Esc => *exit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                login.form.toggle_field()
            }
            KeyCode::Backspace => login.form.backspace(),
            KeyCode::Char(ch) => {
                if login.form.push_char(ch) {
                    login.form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_login_ctrl(&mut self, ch: char) -> (Mode, bool) {
        match ch {
            'n' => (self.attempt_signup(), true),
            's' => {
                if let Screen::Login(login) = &mut self.screen {
                    let visible = login.form.toggle_password_visibility();
                    let message = if visible {
                        "Password visible."
                    } else {
                        "Password hidden."
                    };
                    self.set_status(message, StatusKind::Info);
                }
                (Mode::Normal, true)
            }
            'u' => {
                if let Screen::Login(login) = &mut self.screen {
                    login.form.clear();
                }
                self.clear_status();
                (Mode::Normal, true)
            }
            _ => (Mode::Normal, false),
        }
    }

    fn attempt_login(&mut self) {
        let Screen::Login(login) = &mut self.screen else {
            return;
        };
        let (username, password) = match login.form.parse_login() {
            Ok(pair) => pair,
            Err(err) => {
                let message = err.to_string();
                login.form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                return;
            }
        };
        if login.is_locked() {
            self.set_status(LOCKED_MESSAGE, StatusKind::Error);
            return;
        }

        match self.admin_store.credentials_match(&username, &password) {
            Ok(true) => {
                info!(username = %username, "admin logged in");
                self.open_student_screen(Some(username.as_str()));
            }
            Ok(false) => {
                let attempts = match &mut self.screen {
                    Screen::Login(login) => {
                        login.form.clear_password();
                        login.record_failure()
                    }
                    Screen::Students(_) => 0,
                };
                warn!(username = %username, attempts, "rejected admin login");
                self.set_status(
                    format!("Invalid credentials. Attempt {attempts}/{MAX_LOGIN_ATTEMPTS}"),
                    StatusKind::Error,
                );
            }
            Err(err) => {
                error!(error = %err, "failed to check admin credentials");
                self.set_status("Login error occurred.", StatusKind::Error);
            }
        }
    }

    /// Create an account unless the exact username/password pair is already
    /// stored. Only the same pair counts as a duplicate.
    fn attempt_signup(&mut self) -> Mode {
        let Screen::Login(login) = &mut self.screen else {
            return Mode::Normal;
        };
        let (username, password) = match login.form.parse_signup() {
            Ok(pair) => pair,
            Err(err) => {
                let message = err.to_string();
                login.form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                return Mode::Normal;
            }
        };

        let created = self
            .admin_store
            .credentials_match(&username, &password)
            .and_then(|exists| {
                if exists {
                    Ok(None)
                } else {
                    self.admin_store
                        .create_account(&username, &password)
                        .map(Some)
                }
            });

        match created {
            Ok(Some(account)) => {
                info!(id = account.id, username = %account.username, "admin signed up");
                self.set_status("Account created successfully!", StatusKind::Info);
                Mode::ConfirmLoginAfterSignup { username }
            }
            Ok(None) => {
                self.set_status("Username already exists.", StatusKind::Error);
                Mode::Normal
            }
            Err(err) => {
                error!(error = %err, "failed to create admin account");
                self.set_status("Failed to create account.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn handle_confirm_login_after_signup(&mut self, code: KeyCode, username: String) -> Result<Mode> {
        match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                info!(username = %username, "admin logged in after signup");
                self.open_student_screen(Some(username.as_str()));
                Ok(Mode::Normal)
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                if let Screen::Login(login) = &mut self.screen {
                    login.form.clear();
                }
                self.set_status(
                    format!("Account created for {username}. Log in when ready."),
                    StatusKind::Info,
                );
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmLoginAfterSignup { username }),
        }
    }

    fn handle_students_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Students(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if screen.search.is_some() {
                    screen.set_search(None);
                    self.set_status("Search cleared.", StatusKind::Info);
                }
            }
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::PageUp => screen.move_selection(-PAGE_STEP),
            KeyCode::PageDown => screen.move_selection(PAGE_STEP),
            KeyCode::Home => screen.select_first(),
            KeyCode::End => screen.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Ok(Mode::AddingStudent(StudentForm::default()));
            }
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(student) = screen.current_student().cloned() {
                    self.set_status(
                        format!("Selected student: {}", student.full_name()),
                        StatusKind::Info,
                    );
                    return Ok(Mode::EditingStudent {
                        form: StudentForm::from_student(&student),
                        original: student,
                    });
                }
                self.set_status("Please select a student to update.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                if let Some(student) = screen.current_student() {
                    let confirm = ConfirmStudentDelete::from(student);
                    self.clear_status();
                    return Ok(Mode::ConfirmStudentDelete(confirm));
                }
                self.set_status("Please select a student to delete.", StatusKind::Error);
            }
            KeyCode::Char('/') => {
                let query = screen.search.clone().unwrap_or_default();
                return Ok(Mode::Searching(query));
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                let label = screen.cycle_program_filter();
                let count = screen.record_count_label();
                self.set_status(format!("Filter: {label} ({count})"), StatusKind::Info);
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                let sort = screen.cycle_sort();
                self.set_status(format!("Sorted by {}.", sort.label()), StatusKind::Info);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh_students(),
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.clear_status();
                return Ok(Mode::ConfirmLogout);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_student(&mut self, code: KeyCode, mut form: StudentForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add student cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Enter => match self.save_new_student(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            code => edit_form(&mut form, code),
        }

        if keep_open {
            Ok(Mode::AddingStudent(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_student(
        &mut self,
        code: KeyCode,
        original: Student,
        mut form: StudentForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Enter => match self.save_existing_student(&original, &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            code => edit_form(&mut form, code),
        }

        if keep_open {
            Ok(Mode::EditingStudent { original, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmStudentDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_delete(&confirm) {
                    self.set_status(
                        format!("Error deleting student: {}", surface_error(&err)),
                        StatusKind::Error,
                    );
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmStudentDelete(confirm)),
        }
    }

    fn handle_confirm_logout(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                info!("admin logged out");
                self.screen = Screen::Login(LoginScreen::default());
                self.set_status("Logged out.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.clear_status();
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmLogout),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut query: String) -> Result<Mode> {
        let Screen::Students(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Esc => {
                screen.set_search(None);
                self.set_status("Search cleared.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                let count = screen.record_count_label();
                self.set_status(count, StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::Backspace => {
                query.pop();
                screen.set_search(Some(query.clone()));
            }
            KeyCode::Char(ch) => {
                query.push(ch);
                screen.set_search(Some(query.clone()));
            }
            _ => {}
        }
        Ok(Mode::Searching(query))
    }

    /// Load every record and switch to the student screen. A failed load
    /// still opens the screen, empty, with the error in the footer.
    fn open_student_screen(&mut self, welcome: Option<&str>) {
        match self.student_store.list_all() {
            Ok(students) => {
                let loaded = format!("Loaded {} student records.", students.len());
                self.screen = Screen::Students(StudentScreen::new(students));
                let message = match welcome {
                    Some(username) => format!("Welcome, {username}! {loaded}"),
                    None => loaded,
                };
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => {
                error!(error = %err, "failed to load students");
                self.screen = Screen::Students(StudentScreen::new(Vec::new()));
                self.set_status(
                    format!("Error loading students: {}", store_error_message(err)),
                    StatusKind::Error,
                );
            }
        }
    }

    fn refresh_students(&mut self) {
        match self.reload_students(None) {
            Ok(()) => self.set_status("Data refreshed successfully!", StatusKind::Info),
            Err(err) => self.set_status(
                format!("Error loading students: {}", surface_error(&err)),
                StatusKind::Error,
            ),
        }
    }

    fn reload_students(&mut self, focus_id: Option<i64>) -> Result<()> {
        let students = self
            .student_store
            .list_all()
            .inspect_err(|err| error!(error = %err, "failed to reload students"))
            .context("failed to load students")?;

        if let Screen::Students(screen) = &mut self.screen {
            screen.set_students(students);
            if let Some(id) = focus_id {
                screen.select_id(id);
            }
        }
        Ok(())
    }

    fn save_new_student(&mut self, form: &StudentForm) -> Result<()> {
        let student = form.parse_inputs()?;
        let created = self
            .student_store
            .insert(&student)
            .inspect_err(|err| error!(error = %err, "failed to insert student"))
            .context("failed to add student")?;
        info!(id = created.id, student_number = %created.student_number, "added student");

        self.report_write(
            format!("Student added successfully: {}", created.full_name()),
            StatusKind::Info,
            Some(created.id),
        );
        Ok(())
    }

    fn save_existing_student(&mut self, original: &Student, form: &StudentForm) -> Result<()> {
        let student = form.parse_update(original)?;
        let outcome = self
            .student_store
            .update(&student)
            .inspect_err(|err| error!(error = %err, id = student.id, "failed to update student"))
            .context("failed to update student")?;

        let (message, kind) = match outcome {
            WriteOutcome::Applied => {
                info!(id = student.id, "updated student");
                (
                    format!("Student updated successfully: {}", student.full_name()),
                    StatusKind::Info,
                )
            }
            WriteOutcome::NotFound => {
                warn!(id = student.id, "update addressed a missing student");
                (
                    format!("{} no longer exists.", student.full_name()),
                    StatusKind::Error,
                )
            }
        };
        self.report_write(message, kind, Some(student.id));
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmStudentDelete) -> Result<()> {
        let outcome = self
            .student_store
            .delete(confirm.id)
            .inspect_err(|err| error!(error = %err, id = confirm.id, "failed to delete student"))
            .context("failed to delete student")?;

        let (message, kind) = match outcome {
            WriteOutcome::Applied => {
                info!(id = confirm.id, "deleted student");
                (format!("Student deleted: {}", confirm.name), StatusKind::Info)
            }
            WriteOutcome::NotFound => {
                warn!(id = confirm.id, "delete addressed a missing student");
                (format!("{} was already removed.", confirm.name), StatusKind::Error)
            }
        };
        self.report_write(message, kind, None);
        Ok(())
    }

    /// Report a write that reached the database, then refresh the table. A
    /// failed refresh is appended to the message; it never turns the write
    /// itself into an error.
    fn report_write(&mut self, message: String, kind: StatusKind, focus_id: Option<i64>) {
        match self.reload_students(focus_id) {
            Ok(()) => self.set_status(message, kind),
            Err(err) => self.set_status(
                format!(
                    "{message} The table could not be refreshed: {}",
                    surface_error(&err)
                ),
                StatusKind::Error,
            ),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Login(login) => self.draw_login(frame, content_area, login),
            Screen::Students(screen) => self.draw_students(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingStudent(form) => self.draw_student_form(frame, area, "Add Student", form),
            Mode::EditingStudent { form, .. } => {
                self.draw_student_form(frame, area, "Update Student", form)
            }
            Mode::ConfirmStudentDelete(confirm) => self.draw_confirm(
                frame,
                area,
                "Confirm Delete",
                format!("Are you sure you want to delete student: {}?", confirm.name),
            ),
            Mode::ConfirmLogout => self.draw_confirm(
                frame,
                area,
                "Confirm Logout",
                "Are you sure you want to log out?".to_string(),
            ),
            Mode::ConfirmLoginAfterSignup { username } => self.draw_confirm(
                frame,
                area,
                "Registration Successful",
                format!("Account created successfully for: {username}. Log in now?"),
            ),
            Mode::Searching(query) => self.draw_search_bar(frame, area, query),
            Mode::Normal => {}
        }
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect, login: &LoginScreen) {
        let popup_area = centered_rect(60, 60, area);
        let block = Block::default()
            .title("Admin Login")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let form = &login.form;
        let mut lines = vec![
            Line::from(Span::styled(
                APP_TITLE,
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                timestamp_label(&Local::now()),
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
            form.build_line("Username", LoginField::Username),
            form.build_line("Password", LoginField::Password),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if login.is_locked() {
            lines.push(Line::from(Span::styled(
                LOCKED_MESSAGE,
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to log in • Ctrl+N to sign up • Tab to switch",
                Style::default().fg(Color::Gray),
            )));
        }
        if login.attempts > 0 {
            lines.push(Line::from(format!(
                "Failed attempts: {}/{MAX_LOGIN_ATTEMPTS}",
                login.attempts
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if matches!(self.mode, Mode::Normal) {
            let (prefix, row) = match form.active {
                LoginField::Username => ("Username: ", 3),
                LoginField::Password => ("Password: ", 4),
            };
            let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
            frame.set_cursor_position((cursor_x, inner.y + row));
        }
    }

    fn draw_students(&self, frame: &mut Frame, area: Rect, screen: &StudentScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let search = screen.search.as_deref().unwrap_or("");
        let summary = Line::from(vec![
            Span::styled(
                screen.record_count_label(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "   Program: {}   Sort: {}   Search: {}",
                screen.program_filter_label(),
                screen.sort.label(),
                if search.is_empty() { "-" } else { search },
            )),
        ]);
        frame.render_widget(Paragraph::new(summary), chunks[0]);

        let block = Block::default()
            .title(format!("{APP_TITLE} - Students"))
            .borders(Borders::ALL);

        if screen.filtered.is_empty() {
            let message = if screen.students.is_empty() {
                "No students yet. Press '+' to add one."
            } else {
                "No students match the current search or filter."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, chunks[1]);
            return;
        }

        let header = Row::new(vec![
            "ID",
            "Student Number",
            "First Name",
            "Last Name",
            "Program",
            "Level",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = screen.filtered.iter().map(|student| {
            Row::new(vec![
                Cell::from(student.id.to_string()),
                Cell::from(student.student_number.clone()),
                Cell::from(student.first_name.clone()),
                Cell::from(student.last_name.clone()),
                Cell::from(student.program.clone()),
                Cell::from(student.level.to_string()),
            ])
        });

        let widths = [
            Constraint::Length(6),
            Constraint::Length(16),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Length(6),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .highlight_symbol("> ");

        let mut state = TableState::default();
        state.select(Some(screen.selected));
        frame.render_stateful_widget(table, chunks[1], &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::AddingStudent(_)) | (_, Mode::EditingStudent { .. }) => key_hints(&[
                ("Tab", "Next Field"),
                ("←→", "Level"),
                ("Enter", "Save"),
                ("Ctrl+U", "Clear"),
                ("Esc", "Cancel"),
            ]),
            (_, Mode::ConfirmStudentDelete(_))
            | (_, Mode::ConfirmLogout)
            | (_, Mode::ConfirmLoginAfterSignup { .. }) => {
                key_hints(&[("Y", "Yes"), ("N", "No")])
            }
            (_, Mode::Searching(_)) => key_hints(&[
                ("↑↓", "Navigate"),
                ("Enter", "Keep Search"),
                ("Esc", "Clear Search"),
            ]),
            (Screen::Login(_), Mode::Normal) => key_hints(&[
                ("Enter", "Log In"),
                ("Ctrl+N", "Sign Up"),
                ("Ctrl+S", "Show Password"),
                ("Ctrl+U", "Clear"),
                ("Esc", "Quit"),
            ]),
            (Screen::Students(_), Mode::Normal) => key_hints(&[
                ("+", "Add"),
                ("e", "Update"),
                ("-", "Delete"),
                ("/", "Search"),
                ("f", "Program"),
                ("o", "Sort"),
                ("r", "Refresh"),
                ("l", "Log Out"),
                ("q", "Quit"),
            ]),
        }
    }

    fn draw_student_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &StudentForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = StudentField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let row = StudentField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0) as u16;
        let prefix = form.active.label().len() as u16 + 2;
        let cursor_x = inner.x + prefix + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, question: String) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(question),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, query: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Keys shared by the add and edit forms.
fn edit_form(form: &mut StudentForm, code: KeyCode) {
    match code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Left if form.active == StudentField::Level => {
            form.decrement_level();
        }
        KeyCode::Right if form.active == StudentField::Level => {
            form.increment_level();
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(ch) => {
            if form.push_char(ch) {
                form.error = None;
            }
        }
        _ => {}
    }
}

fn store_error_message(err: StoreError) -> String {
    surface_error(&anyhow::Error::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    fn app() -> (TempDir, App) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("records.sqlite"));
        let admins = AdminAccountStore::new(db.clone());
        let students = StudentRecordStore::new(db);
        admins.ensure_schema().expect("admins schema");
        students.ensure_schema().expect("students schema");
        (dir, App::new(admins, students))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).expect("key");
        }
    }

    fn status_text(app: &App) -> String {
        app.status
            .as_ref()
            .map(|status| status.text.clone())
            .unwrap_or_default()
    }

    fn enter_credentials(app: &mut App, username: &str, password: &str) {
        app.handle_ctrl('u').expect("clear");
        type_text(app, username);
        app.handle_key(KeyCode::Tab).expect("tab");
        type_text(app, password);
    }

    fn login_as_new_admin(app: &mut App) {
        enter_credentials(app, "alice", "pw1234");
        assert!(app.handle_ctrl('n').expect("signup"));
        assert!(matches!(app.mode, Mode::ConfirmLoginAfterSignup { .. }));
        app.handle_key(KeyCode::Char('y')).expect("confirm");
        assert!(matches!(app.screen, Screen::Students(_)));
    }

    fn add_student(app: &mut App, number: &str, first: &str, last: &str, program: &str) {
        app.handle_key(KeyCode::Char('+')).expect("open form");
        type_text(app, number);
        app.handle_key(KeyCode::Tab).expect("tab");
        type_text(app, first);
        app.handle_key(KeyCode::Tab).expect("tab");
        type_text(app, last);
        app.handle_key(KeyCode::Tab).expect("tab");
        type_text(app, program);
        app.handle_key(KeyCode::Enter).expect("save");
    }

    #[test]
    fn signup_then_login_opens_student_screen() {
        let (_dir, mut app) = app();
        login_as_new_admin(&mut app);
        assert_eq!(status_text(&app), "Welcome, alice! Loaded 0 student records.");

        app.handle_key(KeyCode::Char('l')).expect("logout");
        app.handle_key(KeyCode::Char('y')).expect("confirm");
        assert!(app.on_login_screen());

        enter_credentials(&mut app, "alice", "pw1234");
        app.handle_key(KeyCode::Enter).expect("login");
        assert!(matches!(app.screen, Screen::Students(_)));
    }

    #[test]
    fn signup_refuses_an_existing_pair() {
        let (_dir, mut app) = app();
        enter_credentials(&mut app, "alice", "pw1234");
        app.handle_ctrl('n').expect("signup");
        app.handle_key(KeyCode::Char('n')).expect("decline");
        assert!(app.on_login_screen());

        enter_credentials(&mut app, "alice", "pw1234");
        app.handle_ctrl('n').expect("signup");
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), "Username already exists.");
    }

    #[test]
    fn login_locks_after_three_misses() {
        let (_dir, mut app) = app();
        for attempt in 1..=MAX_LOGIN_ATTEMPTS {
            enter_credentials(&mut app, "alice", "wrong");
            app.handle_key(KeyCode::Enter).expect("login");
            assert_eq!(
                status_text(&app),
                format!("Invalid credentials. Attempt {attempt}/{MAX_LOGIN_ATTEMPTS}")
            );
        }

        enter_credentials(&mut app, "alice", "wrong");
        app.handle_key(KeyCode::Enter).expect("login");
        assert_eq!(status_text(&app), LOCKED_MESSAGE);
    }

    #[test]
    fn empty_credentials_are_rejected_before_lookup() {
        let (_dir, mut app) = app();
        app.handle_key(KeyCode::Enter).expect("login");
        assert_eq!(status_text(&app), "Please enter both username and password.");
        let Screen::Login(login) = &app.screen else {
            panic!("expected login screen");
        };
        assert_eq!(login.attempts, 0);
    }

    #[test]
    fn add_update_delete_round_trip() {
        let (_dir, mut app) = app();
        login_as_new_admin(&mut app);

        add_student(&mut app, "S1001", "Jo", "Lee", "CS");
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), "Student added successfully: Jo Lee");
        let stored = app.student_store.list_all().expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, 1);

        app.handle_key(KeyCode::Char('e')).expect("edit");
        assert!(matches!(app.mode, Mode::EditingStudent { .. }));
        app.handle_key(KeyCode::Tab).expect("to level");
        app.handle_key(KeyCode::Right).expect("level up");
        app.handle_key(KeyCode::Right).expect("level up");
        app.handle_key(KeyCode::Enter).expect("save");
        assert!(matches!(app.mode, Mode::Normal));
        let stored = app.student_store.list_all().expect("list");
        assert_eq!(stored[0].level, 3);
        assert_eq!(stored[0].student_number, "S1001");

        app.handle_key(KeyCode::Char('-')).expect("delete");
        app.handle_key(KeyCode::Char('y')).expect("confirm");
        assert_eq!(status_text(&app), "Student deleted: Jo Lee");
        assert!(app.student_store.list_all().expect("list").is_empty());
    }

    #[test]
    fn invalid_student_keeps_form_open() {
        let (_dir, mut app) = app();
        login_as_new_admin(&mut app);

        add_student(&mut app, "S10", "Jo", "Lee", "CS");
        let Mode::AddingStudent(form) = &app.mode else {
            panic!("form should stay open");
        };
        assert_eq!(
            form.error.as_deref(),
            Some("Student number must be at least 5 characters.")
        );
        assert!(app.student_store.list_all().expect("list").is_empty());
    }

    #[test]
    fn update_of_removed_student_reports_missing_row() {
        let (_dir, mut app) = app();
        login_as_new_admin(&mut app);
        add_student(&mut app, "S1001", "Jo", "Lee", "CS");

        app.handle_key(KeyCode::Char('e')).expect("edit");
        let id = app.student_store.list_all().expect("list")[0].id;
        app.student_store.delete(id).expect("external delete");
        app.handle_key(KeyCode::Enter).expect("save");

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), "Jo Lee no longer exists.");
    }

    #[test]
    fn failed_refresh_after_insert_closes_the_form() {
        let (dir, mut app) = app();
        login_as_new_admin(&mut app);

        // Without INTEGER, `id` is no rowid alias and stays NULL, so inserts
        // succeed while listing fails.
        let conn = rusqlite::Connection::open(dir.path().join("records.sqlite")).expect("open");
        conn.execute_batch(
            "DROP TABLE students;
             CREATE TABLE students (id PRIMARY KEY, studentNumber TEXT, firstName TEXT,
                                    lastName TEXT, program TEXT, level INTEGER);",
        )
        .expect("swap table");

        add_student(&mut app, "S1001", "Jo", "Lee", "CS");
        assert!(matches!(app.mode, Mode::Normal));
        let status = status_text(&app);
        assert!(status.starts_with("Student added successfully: Jo Lee"), "{status}");
        assert!(status.contains("could not be refreshed"), "{status}");

        app.handle_key(KeyCode::Enter).expect("enter");
        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM students WHERE studentNumber = 'S1001'",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(rows, 1);
    }

    #[test]
    fn locked_login_still_reports_empty_fields() {
        let (_dir, mut app) = app();
        for _ in 0..MAX_LOGIN_ATTEMPTS {
            enter_credentials(&mut app, "alice", "wrong");
            app.handle_key(KeyCode::Enter).expect("login");
        }

        app.handle_ctrl('u').expect("clear");
        app.handle_key(KeyCode::Enter).expect("login");
        assert_eq!(status_text(&app), "Please enter both username and password.");

        enter_credentials(&mut app, "alice", "wrong");
        app.handle_key(KeyCode::Enter).expect("login");
        assert_eq!(status_text(&app), LOCKED_MESSAGE);
    }

    #[test]
    fn unbound_ctrl_chords_do_not_type() {
        let (_dir, mut app) = app();
        let ctrl = |ch| KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL);

        assert!(!app.handle_key_event(ctrl('a')).expect("chord"));
        let Screen::Login(login) = &app.screen else {
            panic!("expected login screen");
        };
        assert!(login.form.username.is_empty());

        login_as_new_admin(&mut app);
        app.handle_key(KeyCode::Char('+')).expect("open form");
        assert!(!app.handle_key_event(ctrl('x')).expect("chord"));
        let Mode::AddingStudent(form) = &app.mode else {
            panic!("expected add form");
        };
        assert!(form.student_number.is_empty());

        assert!(app.handle_key_event(ctrl('c')).expect("quit"));
    }

    #[test]
    fn unreachable_database_does_not_crash_login() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, b"plain file").expect("write blocker");
        let db = Database::new(blocker.join("records.sqlite"));
        let mut app = App::new(
            AdminAccountStore::new(db.clone()),
            StudentRecordStore::new(db),
        );

        enter_credentials(&mut app, "alice", "pw1234");
        app.handle_key(KeyCode::Enter).expect("login");
        assert_eq!(status_text(&app), "Login error occurred.");
        assert!(app.on_login_screen());
    }

    #[test]
    fn renders_both_screens() {
        let (_dir, mut app) = app();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("terminal");

        terminal.draw(|frame| app.draw(frame)).expect("draw login");
        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("Admin Login"));

        login_as_new_admin(&mut app);
        add_student(&mut app, "S1001", "Jo", "Lee", "CS");
        terminal.draw(|frame| app.draw(frame)).expect("draw students");
        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("S1001"));
        assert!(rendered.contains("Records: 1"));
    }
}
