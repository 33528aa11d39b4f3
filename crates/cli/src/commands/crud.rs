//! Shared execution for the create/get/update/delete resource commands

use anyhow::Result;
use apiprobe_common::{Resource, ResourcePage};

use crate::context::Context;
use crate::output::{print_item, report, with_spinner, TableDisplay};

/// One resource operation with its parsed field arguments
pub enum Action<F> {
    Get(String),
    Create(F),
    Update(String, F),
    Delete(String),
}

/// Field arguments that can be written into a resource form.
/// Only the fields given on the command line are changed.
pub trait ApplyFields<R> {
    fn apply(&self, form: &mut R);
}

/// Run `action` through a fresh page for `R`
pub async fn run<R, F>(ctx: &Context, action: Action<F>) -> Result<()>
where
    R: Resource + TableDisplay,
    F: ApplyFields<R>,
{
    ctx.signed_in()?;
    let page: ResourcePage<R> = ResourcePage::new(ctx.client(R::SERVICE)?, ctx.session.clone());

    match action {
        Action::Get(id) => {
            load(&page, id).await?;
            print_item(&page.form(), ctx.format);
        }

        Action::Create(fields) => {
            page.edit(|form| fields.apply(form));
            let status = with_spinner(&format!("Creating {}...", R::SINGULAR), page.create()).await;
            report(&status)?;
        }

        Action::Update(id, fields) => {
            load(&page, id).await?;
            page.edit(|form| fields.apply(form));
            let status = with_spinner(&format!("Updating {}...", R::SINGULAR), page.update()).await;
            report(&status)?;
            print_item(&page.form(), ctx.format);
        }

        Action::Delete(id) => {
            load(&page, id).await?;
            let status = with_spinner(&format!("Deleting {}...", R::SINGULAR), page.delete()).await;
            report(&status)?;
        }
    }
    Ok(())
}

/// Fetch `id` into the page form
async fn load<R: Resource>(page: &ResourcePage<R>, id: String) -> Result<()> {
    page.set_fetch_id(id);
    let status = with_spinner(&format!("Fetching {}...", R::SINGULAR), page.fetch()).await;
    report(&status)
}

/// Overwrite `slot` when a value was given
pub fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}
