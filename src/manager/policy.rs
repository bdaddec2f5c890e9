use crate::config::LayoutConfig;

use super::ManagerError;

/// Which mutations are allowed where. Checked by the HTTP layer before it
/// calls into [`super::StorageManager`].
#[derive(Debug, Clone)]
pub struct PathPolicy {
    home_root: String,
    albums_root: String,
}

impl PathPolicy {
    pub fn new(layout: &LayoutConfig) -> Self {
        Self {
            home_root: layout.home_root.clone(),
            albums_root: layout.albums_root.clone(),
        }
    }

    pub fn is_root(&self, path: &str) -> bool {
        path == self.home_root || path == self.albums_root
    }

    /// `albuns/<name>`, exactly one level below the albums root.
    fn is_album_folder(&self, path: &str) -> bool {
        match path.strip_prefix(&self.albums_root) {
            Some(rest) => rest
                .strip_prefix('/')
                .is_some_and(|name| !name.is_empty() && !name.contains('/')),
            None => false,
        }
    }

    fn is_under(&self, root: &str, path: &str) -> bool {
        path.strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|rest| !rest.is_empty())
    }

    pub fn check_upload(&self, folder: &str) -> Result<(), ManagerError> {
        if folder == self.home_root || self.is_album_folder(folder) {
            return Ok(());
        }
        Err(ManagerError::Validation(format!(
            "uploads are only allowed in {}/ or inside a folder of {}/",
            self.home_root, self.albums_root
        )))
    }

    pub fn check_create_folder(&self, parent: &str) -> Result<(), ManagerError> {
        if parent == self.albums_root {
            return Ok(());
        }
        Err(ManagerError::Validation(format!(
            "folders can only be created in {}/",
            self.albums_root
        )))
    }

    /// Rename / delete of a folder: album subfolders only, never a root.
    pub fn check_modify_folder(&self, path: &str) -> Result<(), ManagerError> {
        if self.is_root(path) {
            return Err(ManagerError::Validation(format!(
                "'{path}' is a top-level folder and cannot be changed"
            )));
        }
        if self.is_under(&self.albums_root, path) {
            return Ok(());
        }
        Err(ManagerError::Validation(format!(
            "only folders inside {}/ can be renamed or deleted",
            self.albums_root
        )))
    }

    pub fn check_modify_file(&self, path: &str) -> Result<(), ManagerError> {
        if self.is_under(&self.home_root, path) || self.is_under(&self.albums_root, path) {
            return Ok(());
        }
        Err(ManagerError::Validation(format!(
            "only files inside {}/ or {}/ can be changed",
            self.home_root, self.albums_root
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PathPolicy {
        PathPolicy::new(&LayoutConfig::default())
    }

    #[test]
    fn uploads_only_in_home_or_album_folders() {
        let p = policy();
        assert!(p.check_upload("home").is_ok());
        assert!(p.check_upload("albuns/Praia").is_ok());
        assert!(p.check_upload("albuns").is_err());
        assert!(p.check_upload("albuns/Praia/extra").is_err());
        assert!(p.check_upload("home/sub").is_err());
        assert!(p.check_upload("").is_err());
        assert!(p.check_upload("albunsX/Praia").is_err());
    }

    #[test]
    fn folders_created_only_under_albums_root() {
        let p = policy();
        assert!(p.check_create_folder("albuns").is_ok());
        assert!(p.check_create_folder("home").is_err());
        assert!(p.check_create_folder("albuns/Praia").is_err());
    }

    #[test]
    fn roots_are_never_modified() {
        let p = policy();
        assert!(p.check_modify_folder("albuns").is_err());
        assert!(p.check_modify_folder("home").is_err());
        assert!(p.check_modify_folder("albuns/Praia").is_ok());
        assert!(p.check_modify_folder("home/sub").is_err());
    }

    #[test]
    fn files_must_live_under_a_root() {
        let p = policy();
        assert!(p.check_modify_file("home/a.jpg").is_ok());
        assert!(p.check_modify_file("albuns/Praia/1.jpg").is_ok());
        assert!(p.check_modify_file("other/a.jpg").is_err());
        assert!(p.check_modify_file("home").is_err());
    }
}
