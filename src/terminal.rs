use console::{style, StyledObject};

mod bullet_points;
mod prompt;

pub use bullet_points::{BulletPointPrinter, LineWriter, MultiProgressLineWriter};
pub use prompt::{prompt, prompt_secret};

pub fn style_header(header: &str) -> StyledObject<&str> {
    style(header).bold().underlined()
}

pub fn style_institution(name: &str) -> StyledObject<&str> {
    style(name).cyan().bold()
}

pub fn style_account(name: &str) -> StyledObject<&str> {
    style(name).magenta()
}

pub fn style_warning(message: &str) -> StyledObject<&str> {
    style(message).yellow()
}

pub fn style_detail(detail: &str) -> StyledObject<&str> {
    style(detail).italic()
}
