use std::collections::BTreeSet;

use crate::models::Student;

use super::forms::LoginForm;

/// Failed log-in attempts allowed before the login screen refuses further
/// tries for the rest of the session.
pub(crate) const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Label of the program filter entry that matches every record.
pub(crate) const ALL_PROGRAMS: &str = "All Programs";

/// State behind the login/signup screen.
#[derive(Default)]
pub(crate) struct LoginScreen {
    pub(crate) form: LoginForm,
    pub(crate) attempts: u32,
}

impl LoginScreen {
    pub(crate) fn is_locked(&self) -> bool {
        self.attempts >= MAX_LOGIN_ATTEMPTS
    }

    /// Count a rejected attempt and return the running total.
    pub(crate) fn record_failure(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }
}

/// Column the student table is ordered by.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum SortColumn {
    /// Order returned by the store.
    #[default]
    Inserted,
    StudentNumber,
    FirstName,
    LastName,
    Program,
    Level,
}

impl SortColumn {
    pub(crate) fn next(self) -> Self {
        match self {
            SortColumn::Inserted => SortColumn::StudentNumber,
            SortColumn::StudentNumber => SortColumn::FirstName,
            SortColumn::FirstName => SortColumn::LastName,
            SortColumn::LastName => SortColumn::Program,
            SortColumn::Program => SortColumn::Level,
            SortColumn::Level => SortColumn::Inserted,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SortColumn::Inserted => "insertion order",
            SortColumn::StudentNumber => "student number",
            SortColumn::FirstName => "first name",
            SortColumn::LastName => "last name",
            SortColumn::Program => "program",
            SortColumn::Level => "level",
        }
    }

    fn sort(self, students: &mut [Student]) {
        match self {
            SortColumn::Inserted => {}
            SortColumn::StudentNumber => {
                students.sort_by_key(|s| s.student_number.to_lowercase())
            }
            SortColumn::FirstName => students.sort_by_key(|s| s.first_name.to_lowercase()),
            SortColumn::LastName => students.sort_by_key(|s| s.last_name.to_lowercase()),
            SortColumn::Program => students.sort_by_key(|s| s.program.to_lowercase()),
            SortColumn::Level => students.sort_by_key(|s| s.level),
        }
    }
}

/// The student table plus its search, program filter and sort settings.
pub(crate) struct StudentScreen {
    pub(crate) students: Vec<Student>,
    pub(crate) filtered: Vec<Student>,
    pub(crate) search: Option<String>,
    pub(crate) program_filter: Option<String>,
    pub(crate) sort: SortColumn,
    pub(crate) selected: usize,
}

impl StudentScreen {
    pub(crate) fn new(students: Vec<Student>) -> Self {
        let mut screen = Self {
            students,
            filtered: Vec::new(),
            search: None,
            program_filter: None,
            sort: SortColumn::default(),
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    /// Rebuild the visible rows from the full list. Search is a
    /// case-insensitive substring match over every column; the program filter
    /// is an exact match.
    pub(crate) fn apply_filter(&mut self) {
        let query = self
            .search
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let mut rows: Vec<Student> = self
            .students
            .iter()
            .filter(|s| {
                self.program_filter
                    .as_deref()
                    .map_or(true, |program| s.program == program)
            })
            .filter(|s| query.as_deref().map_or(true, |q| matches_query(s, q)))
            .cloned()
            .collect();
        self.sort.sort(&mut rows);
        self.filtered = rows;
        self.ensure_in_bounds();
    }

    pub(crate) fn set_students(&mut self, students: Vec<Student>) {
        self.students = students;
        if let Some(program) = &self.program_filter {
            if !self.students.iter().any(|s| &s.program == program) {
                self.program_filter = None;
            }
        }
        self.apply_filter();
    }

    pub(crate) fn set_search(&mut self, search: Option<String>) {
        self.search = search;
        self.apply_filter();
    }

    /// Distinct programs present in the full list, sorted.
    pub(crate) fn programs(&self) -> Vec<String> {
        self.students
            .iter()
            .map(|s| s.program.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Step through "All Programs" followed by each distinct program and
    /// return the label now active.
    pub(crate) fn cycle_program_filter(&mut self) -> String {
        let programs = self.programs();
        self.program_filter = match &self.program_filter {
            None => programs.first().cloned(),
            Some(current) => programs
                .iter()
                .position(|p| p == current)
                .and_then(|idx| programs.get(idx + 1))
                .cloned(),
        };
        self.apply_filter();
        self.program_filter_label().to_string()
    }

    pub(crate) fn program_filter_label(&self) -> &str {
        self.program_filter.as_deref().unwrap_or(ALL_PROGRAMS)
    }

    pub(crate) fn cycle_sort(&mut self) -> SortColumn {
        self.sort = self.sort.next();
        self.apply_filter();
        self.sort
    }

    pub(crate) fn current_student(&self) -> Option<&Student> {
        self.filtered.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        let new = (self.selected as isize + offset).clamp(0, last);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }

    /// Move the cursor onto the visible row with `id`, if there is one.
    pub(crate) fn select_id(&mut self, id: i64) -> bool {
        match self.filtered.iter().position(|s| s.id == id) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    /// `Records: N`, or `Showing: X of N` while a filter hides rows.
    pub(crate) fn record_count_label(&self) -> String {
        let total = self.students.len();
        let visible = self.filtered.len();
        if total == visible {
            format!("Records: {total}")
        } else {
            format!("Showing: {visible} of {total}")
        }
    }

    fn ensure_in_bounds(&mut self) {
        if self.filtered.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
    }
}

fn matches_query(student: &Student, query: &str) -> bool {
    let id = student.id.to_string();
    let level = student.level.to_string();
    [
        id.as_str(),
        student.student_number.as_str(),
        student.first_name.as_str(),
        student.last_name.as_str(),
        student.program.as_str(),
        level.as_str(),
    ]
    .iter()
    .any(|column| column.to_lowercase().contains(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, number: &str, first: &str, last: &str, program: &str, level: i64) -> Student {
        Student {
            id,
            ..Student::new(number, first, last, program, level)
        }
    }

    fn roster() -> Vec<Student> {
        vec![
            student(1, "S1001", "Jo", "Lee", "CS", 2),
            student(2, "S1002", "Ana", "Cruz", "Math", 5),
            student(3, "S1003", "ben", "Adams", "CS", 1),
        ]
    }

    #[test]
    fn search_is_case_insensitive_across_columns() {
        let mut screen = StudentScreen::new(roster());
        screen.set_search(Some("CRUZ".into()));
        assert_eq!(screen.filtered.len(), 1);
        assert_eq!(screen.filtered[0].id, 2);

        screen.set_search(Some("s100".into()));
        assert_eq!(screen.filtered.len(), 3);

        screen.set_search(Some("  ".into()));
        assert_eq!(screen.filtered.len(), 3);
        assert_eq!(screen.record_count_label(), "Records: 3");
    }

    #[test]
    fn program_filter_cycles_through_distinct_programs() {
        let mut screen = StudentScreen::new(roster());
        assert_eq!(screen.programs(), vec!["CS".to_string(), "Math".to_string()]);

        assert_eq!(screen.cycle_program_filter(), "CS");
        assert_eq!(screen.filtered.len(), 2);
        assert_eq!(screen.record_count_label(), "Showing: 2 of 3");

        assert_eq!(screen.cycle_program_filter(), "Math");
        assert_eq!(screen.filtered.len(), 1);

        assert_eq!(screen.cycle_program_filter(), ALL_PROGRAMS);
        assert_eq!(screen.filtered.len(), 3);
    }

    #[test]
    fn filter_resets_when_program_disappears() {
        let mut screen = StudentScreen::new(roster());
        screen.cycle_program_filter();
        screen.cycle_program_filter();
        assert_eq!(screen.program_filter_label(), "Math");

        let remaining = roster().into_iter().filter(|s| s.program != "Math").collect();
        screen.set_students(remaining);
        assert_eq!(screen.program_filter_label(), ALL_PROGRAMS);
        assert_eq!(screen.filtered.len(), 2);
    }

    #[test]
    fn sort_cycles_columns() {
        let mut screen = StudentScreen::new(roster());
        assert_eq!(screen.cycle_sort(), SortColumn::StudentNumber);
        assert_eq!(screen.cycle_sort(), SortColumn::FirstName);
        let names: Vec<_> = screen.filtered.iter().map(|s| s.first_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "ben", "Jo"]);

        screen.cycle_sort();
        screen.cycle_sort();
        assert_eq!(screen.cycle_sort(), SortColumn::Level);
        let levels: Vec<_> = screen.filtered.iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![1, 2, 5]);

        assert_eq!(screen.cycle_sort(), SortColumn::Inserted);
        let ids: Vec<_> = screen.filtered.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut screen = StudentScreen::new(roster());
        screen.move_selection(10);
        assert_eq!(screen.selected, 2);
        screen.move_selection(-10);
        assert_eq!(screen.selected, 0);

        assert!(screen.select_id(3));
        screen.set_search(Some("Jo".into()));
        assert_eq!(screen.selected, 0);
        assert!(!screen.select_id(3));

        let mut empty = StudentScreen::new(Vec::new());
        empty.move_selection(1);
        empty.select_last();
        assert!(empty.current_student().is_none());
    }

    #[test]
    fn login_locks_after_three_failures() {
        let mut login = LoginScreen::default();
        assert_eq!(login.record_failure(), 1);
        assert_eq!(login.record_failure(), 2);
        assert!(!login.is_locked());
        assert_eq!(login.record_failure(), 3);
        assert!(login.is_locked());
    }
}
