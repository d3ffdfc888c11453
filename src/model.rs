//! Library domain entities stored through the record layer.
//!
//! Field names on disk stay camelCase (`registrationDate`, `currentBooks`)
//! — they are part of the stored format, not a style choice.

use uuid::Uuid;

use crate::link::{Entity, Link, Resolver};
use crate::record::{Record, Value};
use crate::store::{Store, StoreError};

// ── Book ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Fiction,
    NonFiction,
    Mystery,
    SciFi,
    Fantasy,
    Biography,
    History,
    Romance,
    Thriller,
    Horror,
    Poetry,
    Drama,
    Comics,
    Other,
}

impl Genre {
    /// Stored string form (also the display form).
    pub fn name(self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::Mystery => "Mystery",
            Genre::SciFi => "Sci-Fi",
            Genre::Fantasy => "Fantasy",
            Genre::Biography => "Biography",
            Genre::History => "History",
            Genre::Romance => "Romance",
            Genre::Thriller => "Thriller",
            Genre::Horror => "Horror",
            Genre::Poetry => "Poetry",
            Genre::Drama => "Drama",
            Genre::Comics => "Comics",
            Genre::Other => "Other",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "Fiction" => Some(Genre::Fiction),
            "Non-Fiction" => Some(Genre::NonFiction),
            "Mystery" => Some(Genre::Mystery),
            "Sci-Fi" => Some(Genre::SciFi),
            "Fantasy" => Some(Genre::Fantasy),
            "Biography" => Some(Genre::Biography),
            "History" => Some(Genre::History),
            "Romance" => Some(Genre::Romance),
            "Thriller" => Some(Genre::Thriller),
            "Horror" => Some(Genre::Horror),
            "Poetry" => Some(Genre::Poetry),
            "Drama" => Some(Genre::Drama),
            "Comics" => Some(Genre::Comics),
            "Other" => Some(Genre::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl BookStatus {
    pub fn name(self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "available" => Some(BookStatus::Available),
            "borrowed" => Some(BookStatus::Borrowed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub pages: u32,
    pub year: i32,
    pub genre: Genre,
    pub status: BookStatus,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        pages: u32,
        year: i32,
        genre: Genre,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            author: author.into(),
            pages,
            year,
            genre,
            status: BookStatus::Available,
        }
    }
}

impl Entity for Book {
    const COLLECTION: &'static str = "books";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.get("id")?.as_str()?.to_string(),
            title: record.get("title")?.as_str()?.to_string(),
            author: record.get("author")?.as_str()?.to_string(),
            pages: record.get("pages")?.as_f64()? as u32,
            year: record.get("year")?.as_f64()? as i32,
            genre: Genre::from_name(record.get("genre")?.as_str()?)?,
            status: BookStatus::from_name(record.get("status")?.as_str()?)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::Text(self.id.clone()));
        rec.insert("title".into(), Value::Text(self.title.clone()));
        rec.insert("author".into(), Value::Text(self.author.clone()));
        rec.insert("pages".into(), Value::Number(self.pages as f64));
        rec.insert("year".into(), Value::Number(self.year as f64));
        rec.insert("genre".into(), Value::Text(self.genre.name().into()));
        rec.insert("status".into(), Value::Text(self.status.name().into()));
        rec
    }
}

/// Books currently on the shelf.
pub fn available_books(store: &Store) -> Result<Vec<Book>, StoreError> {
    let books = Resolver::<Book>::new(store).load_all()?;
    Ok(books.into_iter().filter(|b| b.status == BookStatus::Available).collect())
}

// ── Employee ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "monday" => Some(DayOfWeek::Monday),
            "tuesday" => Some(DayOfWeek::Tuesday),
            "wednesday" => Some(DayOfWeek::Wednesday),
            "thursday" => Some(DayOfWeek::Thursday),
            "friday" => Some(DayOfWeek::Friday),
            "saturday" => Some(DayOfWeek::Saturday),
            "sunday" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub experience: u32,
    pub work_days: Vec<DayOfWeek>,
}

impl Employee {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        experience: u32,
        work_days: Vec<DayOfWeek>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            surname: surname.into(),
            experience,
            work_days,
        }
    }
}

impl Entity for Employee {
    const COLLECTION: &'static str = "employees";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Record) -> Option<Self> {
        let work_days = match record.get("workDays")? {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().and_then(DayOfWeek::from_name))
                .collect::<Option<Vec<_>>>()?,
            _ => return None,
        };
        Some(Self {
            id: record.get("id")?.as_str()?.to_string(),
            name: record.get("name")?.as_str()?.to_string(),
            surname: record.get("surname")?.as_str()?.to_string(),
            experience: record.get("experience")?.as_f64()? as u32,
            work_days,
        })
    }

    fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::Text(self.id.clone()));
        rec.insert("name".into(), Value::Text(self.name.clone()));
        rec.insert("surname".into(), Value::Text(self.surname.clone()));
        rec.insert("experience".into(), Value::Number(self.experience as f64));
        rec.insert(
            "workDays".into(),
            Value::Array(
                self.work_days
                    .iter()
                    .map(|d| serde_json::Value::String(d.name().to_string()))
                    .collect(),
            ),
        );
        rec
    }
}

/// Employees whose schedule includes `day`.
pub fn employees_working_on(store: &Store, day: DayOfWeek) -> Result<Vec<Employee>, StoreError> {
    let employees = Resolver::<Employee>::new(store).load_all()?;
    Ok(employees.into_iter().filter(|e| e.work_days.contains(&day)).collect())
}

// ── Visitor ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Visitor {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub registration_date: String,
    pub current_books: Vec<Link>,
    pub history: Vec<Link>,
}

impl Visitor {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        registration_date: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            surname: surname.into(),
            registration_date: registration_date.into(),
            current_books: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl Entity for Visitor {
    const COLLECTION: &'static str = "visitors";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.get("id")?.as_str()?.to_string(),
            name: record.get("name")?.as_str()?.to_string(),
            surname: record.get("surname")?.as_str()?.to_string(),
            registration_date: record.get("registrationDate")?.as_str()?.to_string(),
            current_books: record.get("currentBooks")?.as_links()?,
            history: record.get("history")?.as_links()?,
        })
    }

    fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::Text(self.id.clone()));
        rec.insert("name".into(), Value::Text(self.name.clone()));
        rec.insert("surname".into(), Value::Text(self.surname.clone()));
        rec.insert("registrationDate".into(), Value::Text(self.registration_date.clone()));
        rec.insert("currentBooks".into(), Value::Links(self.current_books.clone()));
        rec.insert("history".into(), Value::Links(self.history.clone()));
        rec
    }
}

/// Read-only denormalized view of a visitor: link fields replaced by the
/// resolved books.  The stored record is untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitorView {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub registration_date: String,
    pub current_books: Vec<Book>,
    pub history: Vec<Book>,
}

/// Resolve a visitor's book links against the books collection.
/// Missing targets are dropped, per [`Resolver::resolve_many`] policy.
pub fn enrich_visitor(store: &Store, visitor: &Visitor) -> Result<VisitorView, StoreError> {
    let books = Resolver::<Book>::new(store);
    Ok(VisitorView {
        id: visitor.id.clone(),
        name: visitor.name.clone(),
        surname: visitor.surname.clone(),
        registration_date: visitor.registration_date.clone(),
        current_books: books.resolve_many(&visitor.current_books)?,
        history: books.resolve_many(&visitor.history)?,
    })
}

/// Every visitor, enriched.
pub fn all_visitors_enriched(store: &Store) -> Result<Vec<VisitorView>, StoreError> {
    let visitors = Resolver::<Visitor>::new(store).load_all()?;
    visitors.iter().map(|v| enrich_visitor(store, v)).collect()
}
