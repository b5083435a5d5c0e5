use log::info;

use crate::{
    db_types::{Employee, User, STATUS_ENABLED},
    helpers::hash_password,
    storefront_objects::{NewEmployee, NewUser},
    traits::{StaffManagement, StorefrontError},
};

/// Back-office employees and consumer users. Passwords never reach storage in the clear; they are
/// hashed here, at the API boundary.
pub struct StaffApi<B> {
    db: B,
}

impl<B> StaffApi<B>
where B: StaffManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, StorefrontError> {
        let mut employee = employee.clone();
        employee.password = hash_password(&employee.password);
        let employee = self.db.create_employee(&employee).await?;
        info!("🪪️ Employee [{}] created with id {}", employee.username, employee.id);
        Ok(employee)
    }

    /// Updates the employee record as-is; the password field is expected to hold the stored hash.
    pub async fn update_employee(&self, employee: &Employee) -> Result<(), StorefrontError> {
        self.db.update_employee(employee).await
    }

    pub async fn employee(&self, id: i64) -> Result<Option<Employee>, StorefrontError> {
        self.db.fetch_employee(id).await
    }

    pub async fn set_employee_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        self.db.set_employee_status(id, status).await
    }

    /// Checks a login attempt. Returns the employee on a match against an enabled account, `None`
    /// on a wrong password, an unknown username, or a disabled account.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Employee>, StorefrontError> {
        let Some(employee) = self.db.fetch_employee_by_username(username).await? else {
            return Ok(None);
        };
        if employee.status != STATUS_ENABLED || employee.password != hash_password(password) {
            return Ok(None);
        }
        Ok(Some(employee))
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, StorefrontError> {
        self.db.create_user(user).await
    }

    pub async fn user(&self, id: i64) -> Result<Option<User>, StorefrontError> {
        self.db.fetch_user(id).await
    }

    /// The wechat-style login path: find or create the user keyed on the provider openid.
    pub async fn user_by_openid_or_create(&self, user: &NewUser) -> Result<User, StorefrontError> {
        if let Some(existing) = self.db.fetch_user_by_openid(&user.openid).await? {
            return Ok(existing);
        }
        let user = self.db.create_user(user).await?;
        info!("🪪️ New user #{} registered via openid", user.id);
        Ok(user)
    }
}
