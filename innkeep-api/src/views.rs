//! Minimal server-side HTML. Rendering is deliberately plain string building;
//! the pages exist to carry the workflow (forms, flashes, redirects), not to
//! be a template system.

use chrono::NaiveDate;

use innkeep_core::forms::{ContactForm, FieldErrors, LoginForm};
use innkeep_core::models::Room;

use crate::session::Flashes;

fn esc(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn flash_block(flashes: &Flashes) -> String {
    let mut out = String::new();
    if let Some(flash) = &flashes.flash {
        out.push_str(&format!(r#"<p class="flash">{}</p>"#, esc(flash)));
    }
    if let Some(warning) = &flashes.warning {
        out.push_str(&format!(r#"<p class="warning">{}</p>"#, esc(warning)));
    }
    if let Some(error) = &flashes.error {
        out.push_str(&format!(r#"<p class="error">{}</p>"#, esc(error)));
    }
    out
}

fn layout(title: &str, flashes: &Flashes, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - Innkeep</title></head>
<body>
<nav>
  <a href="/">Home</a>
  <a href="/about">About</a>
  <a href="/rooms/generals-quarters">General's Quarters</a>
  <a href="/rooms/majors-suite">Major's Suite</a>
  <a href="/search-availability">Book Now</a>
  <a href="/contact">Contact</a>
  <a href="/user/login">Login</a>
</nav>
{flashes}
<main>
{body}
</main>
</body>
</html>"#,
        title = esc(title),
        flashes = flash_block(flashes),
        body = body,
    )
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    match errors.get(field) {
        Some(message) => format!(r#"<span class="field-error">{}</span>"#, esc(message)),
        None => String::new(),
    }
}

pub fn error_page() -> String {
    layout(
        "Something went wrong",
        &Flashes::default(),
        "<h1>Something went wrong</h1><p>Please try again in a moment.</p>",
    )
}

pub fn home_page(flashes: &Flashes) -> String {
    layout(
        "Welcome",
        flashes,
        "<h1>Welcome to Innkeep</h1>\
         <p>A quiet bed and breakfast. Check availability and book your stay.</p>\
         <p><a href=\"/search-availability\">Check availability</a></p>",
    )
}

pub fn about_page(flashes: &Flashes) -> String {
    layout(
        "About",
        flashes,
        "<h1>About us</h1><p>Two rooms, one breakfast, no surprises.</p>",
    )
}

pub fn contact_page(flashes: &Flashes) -> String {
    layout(
        "Contact",
        flashes,
        "<h1>Contact</h1><p>Write to stay@innkeep.example and we will get back to you.</p>",
    )
}

pub fn room_page(flashes: &Flashes, room_name: &str) -> String {
    let body = format!(
        "<h1>{name}</h1>\
         <p>See the {name} and make it yours for a few nights.</p>\
         <p><a href=\"/search-availability\">Check availability</a></p>",
        name = esc(room_name),
    );
    layout(room_name, flashes, &body)
}

pub fn search_page(flashes: &Flashes) -> String {
    layout(
        "Search for availability",
        flashes,
        r#"<h1>Search for availability</h1>
<form action="/search-availability" method="post">
  <label for="start">Starting date</label>
  <input type="text" name="start" id="start" placeholder="YYYY-MM-DD" required>
  <label for="end">Ending date</label>
  <input type="text" name="end" id="end" placeholder="YYYY-MM-DD" required>
  <button type="submit">Search availability</button>
</form>"#,
    )
}

pub fn choose_room_page(flashes: &Flashes, rooms: &[Room]) -> String {
    let mut items = String::new();
    for room in rooms {
        items.push_str(&format!(
            r#"<li><a href="/choose-room/{id}">{name}</a></li>"#,
            id = room.id,
            name = esc(&room.room_name),
        ));
    }
    let body = format!("<h1>Choose a room</h1><ul>{}</ul>", items);
    layout("Choose a room", flashes, &body)
}

pub fn reservation_form_page(
    flashes: &Flashes,
    room_name: &str,
    start: NaiveDate,
    end: NaiveDate,
    form: &ContactForm,
    errors: &FieldErrors,
) -> String {
    let body = format!(
        r#"<h1>Make a reservation</h1>
<p>{room}: {start} to {end}</p>
<form action="/make-reservation" method="post">
  <label for="first_name">First name</label>{fn_err}
  <input type="text" name="first_name" id="first_name" value="{first}">
  <label for="last_name">Last name</label>{ln_err}
  <input type="text" name="last_name" id="last_name" value="{last}">
  <label for="email">Email</label>{em_err}
  <input type="text" name="email" id="email" value="{email}">
  <label for="phone">Phone</label>
  <input type="text" name="phone" id="phone" value="{phone}">
  <button type="submit">Make reservation</button>
</form>"#,
        room = esc(room_name),
        start = start.format("%Y-%m-%d"),
        end = end.format("%Y-%m-%d"),
        fn_err = field_error(errors, "first_name"),
        ln_err = field_error(errors, "last_name"),
        em_err = field_error(errors, "email"),
        first = esc(&form.first_name),
        last = esc(&form.last_name),
        email = esc(&form.email),
        phone = esc(&form.phone),
    );
    layout("Make a reservation", flashes, &body)
}

#[allow(clippy::too_many_arguments)]
pub fn summary_page(
    flashes: &Flashes,
    room_name: &str,
    start: NaiveDate,
    end: NaiveDate,
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
) -> String {
    let body = format!(
        r#"<h1>Reservation summary</h1>
<table>
  <tr><th>Name</th><td>{first} {last}</td></tr>
  <tr><th>Room</th><td>{room}</td></tr>
  <tr><th>Arrival</th><td>{start}</td></tr>
  <tr><th>Departure</th><td>{end}</td></tr>
  <tr><th>Email</th><td>{email}</td></tr>
  <tr><th>Phone</th><td>{phone}</td></tr>
</table>"#,
        first = esc(first_name),
        last = esc(last_name),
        room = esc(room_name),
        start = start.format("%Y-%m-%d"),
        end = end.format("%Y-%m-%d"),
        email = esc(email),
        phone = esc(phone),
    );
    layout("Reservation summary", flashes, &body)
}

pub fn login_page(flashes: &Flashes, form: &LoginForm, errors: &FieldErrors) -> String {
    let body = format!(
        r#"<h1>Login</h1>
<form action="/user/login" method="post">
  <label for="email">Email</label>{em_err}
  <input type="text" name="email" id="email" value="{email}">
  <label for="password">Password</label>{pw_err}
  <input type="password" name="password" id="password" value="">
  <button type="submit">Login</button>
</form>"#,
        em_err = field_error(errors, "email"),
        pw_err = field_error(errors, "password"),
        email = esc(&form.email),
    );
    layout("Login", flashes, &body)
}

pub fn dashboard_page(flashes: &Flashes, rooms: &[Room]) -> String {
    let mut items = String::new();
    for room in rooms {
        items.push_str(&format!("<li>{}</li>", esc(&room.room_name)));
    }
    let body = format!(
        "<h1>Dashboard</h1><p>Rooms under management:</p><ul>{}</ul>\
         <p><a href=\"/user/logout\">Logout</a></p>",
        items
    );
    layout("Dashboard", flashes, &body)
}
