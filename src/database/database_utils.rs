use std::sync::{Arc, Mutex, MutexGuard};
use log::error;
use rocket::State;
use crate::Error;

pub trait StoreExtension<T> {
    fn acquire(&self) -> Result<MutexGuard<'_, T>, Error>;
}

impl<T> StoreExtension<T> for Arc<Mutex<T>> {
    fn acquire(&self) -> Result<MutexGuard<'_, T>, Error> {
        match self.lock() {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("Failed to lock {}, {}", std::any::type_name::<T>(), err);

                Err(Error::InternalError(String::from("An internal error on the server's end has occurred")))
            }
        }
    }
}

impl<T: Send + Sync + 'static> StoreExtension<T> for &State<Arc<Mutex<T>>> {
    fn acquire(&self) -> Result<MutexGuard<'_, T>, Error> {
        self.inner().acquire()
    }
}
