//! Export documents: a plain-text application report and a crew-list CSV.
//! The consumer treats the format as opaque; failures surface as a single
//! `Export` error and are logged generically by the caller.

use chrono::{DateTime, Utc};
use prettytable::{Table, format, row};

use crate::error::DeskError;
use crate::festival::models::{ApplicationRecord, Education, FileRef, Language};
use crate::festival::score;

/// Mirrors the dashboard's size badge: megabytes with two decimals, with a
/// bare "0 MB" for absent sizes.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 MB".to_string();
    }
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn format_date(t: DateTime<Utc>) -> String {
    t.format("%b %d, %Y %H:%M").to_string()
}

fn format_opt_date(t: Option<DateTime<Utc>>) -> String {
    t.map(format_date).unwrap_or_else(|| "-".to_string())
}

fn file_status(file: &FileRef, lang: Language) -> &'static str {
    if file.is_present() {
        lang.pick("Verified", "ตรวจสอบแล้ว")
    } else {
        lang.pick("Missing File", "ไฟล์หายไป")
    }
}

/// Renders the full application report in the requested language. Layout
/// follows the detail page: film information, contact, education, crew,
/// files, scores, timeline.
pub fn application_report(app: &ApplicationRecord, lang: Language) -> String {
    let mut out = String::new();
    let summary = score::summarize(&app.scores);

    out.push_str(&format!(
        "{}: {}\n",
        lang.pick("Application Details", "รายละเอียดใบสมัคร"),
        app.display_title(lang)
    ));
    out.push_str(&format!(
        "{} | {}\n\n",
        app.application_id,
        app.competition_category.as_str()
    ));

    let mut film = Table::new();
    film.set_format(*format::consts::FORMAT_BOX_CHARS);
    film.set_titles(row![lang.pick("Film Information", "ข้อมูลภาพยนตร์"), ""]);
    film.add_row(row![lang.pick("Nationality", "สัญชาติ"), app.nationality]);
    film.add_row(row![
        lang.pick("Format", "รายละเอียดรูปแบบ"),
        app.format.as_str()
    ]);
    film.add_row(row![
        lang.pick("Duration", "ความยาว"),
        format!("{} {}", app.duration, lang.pick("minutes", "นาที"))
    ]);
    film.add_row(row![lang.pick("Genres", "แนวภาพยนตร์"), app.genres.join(", ")]);
    film.add_row(row![lang.pick("Synopsis", "เรื่องย่อ"), app.synopsis]);
    if let Some(connection) = &app.chiangmai_connection {
        film.add_row(row![
            lang.pick("Connection to Chiang Mai", "ความเกี่ยวข้องกับเชียงใหม่"),
            connection
        ]);
    }
    out.push_str(&film.to_string());
    out.push('\n');

    let contact = app.contact_info();
    let mut contact_table = Table::new();
    contact_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    contact_table.set_titles(row![lang.pick("Contact Information", "ข้อมูลติดต่อ"), ""]);
    contact_table.add_row(row![
        lang.pick("Name", "ชื่อ"),
        lang.pick_name(contact.name, contact.name_th)
    ]);
    if let Some(age) = contact.age {
        contact_table.add_row(row![
            lang.pick("Age", "อายุ"),
            format!("{} {}", age, lang.pick("years old", "ปี"))
        ]);
    }
    contact_table.add_row(row![
        lang.pick("Role in Film", "บทบาทในภาพยนตร์"),
        match contact.custom_role {
            Some(custom) if contact.role == "Other" => custom,
            _ => contact.role,
        }
    ]);
    contact_table.add_row(row![lang.pick("Phone", "โทรศัพท์"), contact.phone]);
    contact_table.add_row(row![lang.pick("Email", "อีเมล"), contact.email]);
    out.push_str(&contact_table.to_string());
    out.push('\n');

    if let Some(education) = app.education() {
        let mut edu = Table::new();
        edu.set_format(*format::consts::FORMAT_BOX_CHARS);
        edu.set_titles(row![lang.pick("Educational Details", "ข้อมูลการศึกษา"), ""]);
        match education {
            Education::School { institution, id } => {
                edu.add_row(row![lang.pick("School", "โรงเรียน"), institution]);
                edu.add_row(row![lang.pick("Student ID", "รหัสนักเรียน/นักศึกษา"), id]);
            }
            Education::University {
                institution,
                faculty,
                id,
            } => {
                edu.add_row(row![lang.pick("University", "มหาวิทยาลัย"), institution]);
                edu.add_row(row![lang.pick("Faculty/Department", "คณะ/สาขา"), faculty]);
                edu.add_row(row![lang.pick("Student ID", "รหัสนักเรียน/นักศึกษา"), id]);
            }
        }
        out.push_str(&edu.to_string());
        out.push('\n');
    }

    let mut crew = Table::new();
    crew.set_format(*format::consts::FORMAT_BOX_CHARS);
    crew.set_titles(row![
        lang.pick("Name", "ชื่อ"),
        lang.pick("Role", "บทบาท"),
        lang.pick("Age", "อายุ"),
        lang.pick("Contact", "ติดต่อ"),
        lang.pick("Institution", "สถาบัน")
    ]);
    for member in &app.crew_members {
        let contact = [member.phone.as_deref(), member.email.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        let institution = [member.school_name.as_deref(), member.student_id.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        crew.add_row(row![
            member.display_name(lang),
            member.display_role(),
            member.age,
            contact,
            institution
        ]);
    }
    out.push_str(&format!(
        "{} ({})\n",
        lang.pick("Crew Members", "สมาชิกทีมงาน"),
        app.crew_members.len()
    ));
    if app.crew_members.is_empty() {
        out.push_str(lang.pick("No additional crew members", "ไม่มีทีมงานเพิ่มเติม"));
        out.push('\n');
    } else {
        out.push_str(&crew.to_string());
    }
    out.push('\n');

    let mut files = Table::new();
    files.set_format(*format::consts::FORMAT_BOX_CHARS);
    files.set_titles(row![
        "",
        lang.pick("File Status", "สถานะไฟล์"),
        lang.pick("File Size", "ขนาดไฟล์"),
        ""
    ]);
    files.add_row(row![
        lang.pick("Film File", "ไฟล์ภาพยนตร์"),
        file_status(&app.files.film_file, lang),
        format_file_size(app.files.film_file.size),
        app.files.film_file.name
    ]);
    files.add_row(row![
        lang.pick("Poster", "โปสเตอร์"),
        file_status(&app.files.poster_file, lang),
        format_file_size(app.files.poster_file.size),
        app.files.poster_file.name
    ]);
    if let Some(proof) = &app.files.proof_file {
        files.add_row(row![
            lang.pick("Proof Document", "เอกสารหลักฐาน"),
            file_status(proof, lang),
            format_file_size(proof.size),
            proof.name
        ]);
    }
    out.push_str(&files.to_string());
    out.push('\n');

    out.push_str(&format!(
        "{}: {:.1}/{} ({} {})\n",
        lang.pick("Average Score", "คะแนนเฉลี่ย"),
        summary.average,
        score::MAX_TOTAL_SCORE,
        summary.count,
        lang.pick("scores", "คะแนน")
    ));
    for entry in &app.scores {
        out.push_str(&format!(
            "  - {}: {:.1} ({})\n",
            entry.admin_name,
            entry.total_score,
            format_date(entry.scored_at)
        ));
    }
    out.push('\n');

    let mut timeline = Table::new();
    timeline.set_format(*format::consts::FORMAT_BOX_CHARS);
    timeline.set_titles(row![
        lang.pick("Application Timeline", "ไทม์ไลน์การสมัคร"),
        ""
    ]);
    timeline.add_row(row![
        lang.pick("Draft Created", "สร้างร่าง"),
        format_date(app.created_at)
    ]);
    timeline.add_row(row![
        lang.pick("Last Modified", "แก้ไขล่าสุด"),
        format_date(app.last_modified)
    ]);
    timeline.add_row(row![
        lang.pick("Submitted", "ส่งใบสมัคร"),
        format_opt_date(app.submitted_at)
    ]);
    timeline.add_row(row![
        lang.pick("Last Reviewed", "ตรวจสอบล่าสุด"),
        format_opt_date(app.last_reviewed_at)
    ]);
    out.push_str(&timeline.to_string());

    out
}

/// Crew roster as CSV, one row per member.
pub fn crew_csv(app: &ApplicationRecord) -> Result<String, DeskError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Name",
            "Localized Name",
            "Role",
            "Age",
            "Phone",
            "Email",
            "School",
            "Student ID",
        ])
        .map_err(|e| DeskError::Export(e.to_string()))?;

    for member in &app.crew_members {
        writer
            .write_record([
                member.full_name.as_str(),
                member.full_name_th.as_deref().unwrap_or(""),
                member.display_role(),
                &member.age.to_string(),
                member.phone.as_deref().unwrap_or(""),
                member.email.as_deref().unwrap_or(""),
                member.school_name.as_deref().unwrap_or(""),
                member.student_id.as_deref().unwrap_or(""),
            ])
            .map_err(|e| DeskError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DeskError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DeskError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::festival::models::CrewMember;
    use crate::festival::normalize::normalize_submission;
    use serde_json::json;

    fn sample() -> ApplicationRecord {
        let raw = json!({
            "filmTitle": "Lanna Lights",
            "filmTitleTh": "แสงล้านนา",
            "competitionCategory": "youth",
            "schoolName": "Chiang Mai School",
            "studentId": "CM-042",
            "genres": ["Drama"],
            "duration": 12,
            "files": {
                "filmFile": { "url": "https://blob/f.mp4", "name": "f.mp4", "size": 2_621_440 },
                "posterFile": {},
            },
            "scores": [
                { "adminId": "a", "adminName": "Judge A", "totalScore": 30.0,
                  "scoredAt": "2025-06-02T09:00:00Z" },
                { "adminId": "b", "adminName": "Judge B", "totalScore": 20.0,
                  "scoredAt": "2025-06-03T09:00:00Z" },
            ],
            "createdAt": "2025-06-01T10:00:00Z",
        });
        normalize_submission("app-1", &raw)
    }

    #[test]
    fn file_sizes_match_dashboard_formatting() {
        assert_eq!(format_file_size(0), "0 MB");
        assert_eq!(format_file_size(1_048_576), "1.00 MB");
        assert_eq!(format_file_size(2_621_440), "2.50 MB");
    }

    #[test]
    fn report_carries_title_score_summary_and_file_status() {
        let report = application_report(&sample(), Language::En);
        assert!(report.contains("Lanna Lights"));
        assert!(report.contains("25.0/40"));
        assert!(report.contains("Verified"));
        assert!(report.contains("Missing File"));
        assert!(report.contains("2.50 MB"));
    }

    #[test]
    fn report_localizes_labels_and_title() {
        let report = application_report(&sample(), Language::Th);
        assert!(report.contains("แสงล้านนา"));
        assert!(report.contains("คะแนนเฉลี่ย"));
        assert!(report.contains("ตรวจสอบแล้ว"));
    }

    #[test]
    fn crew_csv_has_header_and_one_row_per_member() {
        let mut app = sample();
        app.crew_members = vec![
            CrewMember {
                full_name: "Anong".to_string(),
                role: "Other".to_string(),
                custom_role: Some("Drone Operator".to_string()),
                age: 17,
                ..Default::default()
            },
            CrewMember {
                full_name: "Boonmee".to_string(),
                role: "Editor".to_string(),
                age: 19,
                ..Default::default()
            },
        ];

        let csv = crew_csv(&app).unwrap();
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name,"));
        assert!(lines[1].contains("Drone Operator"));
    }
}
