/// Closing message shown with the final score, tiered by percentage of the
/// maximum and addressed to the participant by name.
pub(crate) fn motivation_message(student_name: &str, score: i32, max_score: i32) -> String {
    let percentage = if max_score > 0 { score as f64 / max_score as f64 * 100.0 } else { 0.0 };

    if percentage >= 100.0 {
        format!("Luar biasa, {student_name}! Nilai Sempurna! Pertahankan prestasimu!")
    } else if percentage >= 80.0 {
        format!("Hebat, {student_name}! Hasil yang sangat memuaskan.")
    } else if percentage >= 60.0 {
        format!("Bagus, {student_name}! Teruslah belajar untuk hasil yang lebih baik lagi.")
    } else {
        format!(
            "Jangan menyerah, {student_name}! Kegagalan adalah awal dari kesuksesan. \
             Ayo belajar lebih giat!"
        )
    }
}
